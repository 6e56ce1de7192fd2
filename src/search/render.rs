//! Result rendering
//!
//! Turns engine results into the markup placed in the results container and
//! the statistics line. Everything interpolated is escaped; the only raw
//! markup that survives from highlighting is `<mark>`.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use unicode_segmentation::UnicodeSegmentation;

use super::context::SearchContext;
use super::engine::QueryResult;
use super::highlight::{escape_html, highlight};
use super::ranking::{relevance_percent, Field};

/// Shown in the results container when the index cannot be loaded
pub const LOAD_FAILURE_HTML: &str = r#"<p class="search-error">Failed to load search index.</p>"#;

/// Content excerpt length (UTF-16 units) used when a page has no summary
pub const EXCERPT_LEN: usize = 200;

/// Maximum number of tag chips per result
pub const MAX_TAGS: usize = 5;

/// Output of one search, ready for the view
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSearch {
    pub query: String,
    pub result_count: usize,
    pub results_html: String,
    pub stats: String,
}

/// Run one timed search and render it
pub fn search_and_render(context: &SearchContext, query: &str) -> RenderedSearch {
    let (results, elapsed) = context.timed_search(query);
    render(&results, query, elapsed)
}

/// Render results in engine order
pub fn render(results: &[QueryResult<'_>], query: &str, elapsed: Duration) -> RenderedSearch {
    let secs = format_elapsed(elapsed);

    if results.is_empty() {
        let results_html = format!(
            concat!(
                "<div class=\"no-results\">\n",
                "  <div class=\"no-results__icon\">🔍</div>\n",
                "  <h3>No results found for \"{}\"</h3>\n",
                "  <p>Try different keywords or check the spelling.</p>\n",
                "</div>\n"
            ),
            escape_html(query)
        );
        return RenderedSearch {
            query: query.to_string(),
            result_count: 0,
            results_html,
            stats: format!("No results found in {}s", secs),
        };
    }

    let count = results.len();
    let stats = format!(
        "Found <span>{}</span> result{} in {}s",
        count,
        if count == 1 { "" } else { "s" },
        secs
    );

    let results_html = results.iter().map(render_result).collect::<String>();

    RenderedSearch {
        query: query.to_string(),
        result_count: count,
        results_html,
        stats,
    }
}

fn render_result(result: &QueryResult<'_>) -> String {
    let item = result.item;

    let meta: String = std::iter::once(escape_html(&format_date(&item.date)))
        .chain(item.first_category().map(escape_html))
        .chain(item.reading_minutes().map(|minutes| format!("{} min read", minutes)))
        .map(|text| format!("    <span>{}</span>\n", text))
        .collect();

    let summary = match item.summary_text() {
        Some(summary) => summary.to_string(),
        None => format!("{}...", excerpt(&item.content, EXCERPT_LEN)),
    };

    let tags = if item.tags.is_empty() {
        String::new()
    } else {
        let chips: String = item
            .tags
            .iter()
            .take(MAX_TAGS)
            .map(|tag| format!("<span class=\"tag\">{}</span>", escape_html(tag)))
            .collect();
        format!("  <div class=\"search-result__tags\">{}</div>\n", chips)
    };

    format!(
        concat!(
            "<article class=\"search-result\">\n",
            "  <div class=\"search-result__header\">\n",
            "    <h2 class=\"search-result__title\"><a href=\"{href}\">{title}</a></h2>\n",
            "    <span class=\"search-result__score\">{score}%</span>\n",
            "  </div>\n",
            "  <div class=\"search-result__meta\">\n",
            "{meta}",
            "  </div>\n",
            "  <p class=\"search-result__summary\">{summary}</p>\n",
            "{tags}",
            "</article>\n"
        ),
        href = escape_html(&item.permalink),
        title = highlight(&item.title, &result.matches, &[Field::Title]),
        score = relevance_percent(result.score),
        meta = meta,
        summary = highlight(&summary, &result.matches, &[Field::Summary, Field::Content]),
        tags = tags,
    )
}

/// Seconds with three decimals
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.3}", elapsed.as_secs_f64())
}

/// `Jan 15, 2024` style date; unparseable input renders as `Invalid Date`
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()));

    match date {
        Ok(date) => date.format("%b %-d, %Y").to_string(),
        Err(_) => "Invalid Date".to_string(),
    }
}

/// Leading part of `text` no longer than `max_units` UTF-16 units
///
/// Cuts on grapheme boundaries so combined characters are never split.
pub fn excerpt(text: &str, max_units: usize) -> &str {
    let mut units = 0usize;
    let mut end = 0usize;
    for (byte, grapheme) in text.grapheme_indices(true) {
        let width: usize = grapheme.chars().map(char::len_utf16).sum();
        if units + width > max_units {
            break;
        }
        units += width;
        end = byte + grapheme.len();
    }
    &text[..end]
}
