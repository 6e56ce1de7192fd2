//! Match highlighting on HTML-escaped text
//!
//! Takes the raw per-field match ranges reported by the engine, merges
//! overlapping and adjacent ranges, and wraps the matched substrings in
//! `<mark>` while escaping everything else exactly once.

use super::engine::FieldMatch;
use super::ranking::Field;

pub const MARK_OPEN: &str = "<mark>";
pub const MARK_CLOSE: &str = "</mark>";

/// Escape text for interpolation into HTML content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Sort ranges by start and coalesce those that overlap or touch
///
/// A range is folded into the current one when `start <= current.end + 1`.
pub fn merge_ranges(mut ranges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    ranges.sort_by_key(|r| r.0);

    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        let end = end.max(start);
        match merged.last_mut() {
            Some(current) if start <= current.1.saturating_add(1) => {
                current.1 = current.1.max(end);
            }
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Highlight `text` using the matches recorded for any of `keys`
///
/// Offsets are inclusive UTF-16 units. Ranges past the end of the text are
/// dropped or clamped, and ranges that split a surrogate pair are widened to
/// the whole character.
pub fn highlight(text: &str, matches: &[FieldMatch], keys: &[Field]) -> String {
    if matches.is_empty() {
        return escape_html(text);
    }

    let ranges: Vec<(usize, usize)> = matches
        .iter()
        .filter(|m| keys.contains(&m.key))
        .flat_map(|m| m.indices.iter().copied())
        .collect();

    if ranges.is_empty() {
        return escape_html(text);
    }

    let spans = byte_spans(text, &merge_ranges(ranges));

    let mut out = String::with_capacity(text.len() + spans.len() * 13);
    let mut last = 0usize;
    for (start, end) in spans {
        out.push_str(&escape_html(&text[last..start]));
        out.push_str(MARK_OPEN);
        out.push_str(&escape_html(&text[start..end]));
        out.push_str(MARK_CLOSE);
        last = end;
    }
    out.push_str(&escape_html(&text[last..]));

    out
}

/// Map merged inclusive UTF-16 ranges onto half-open byte spans of `text`
///
/// Spans come out ascending and disjoint, aligned to char boundaries.
fn byte_spans(text: &str, ranges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    // (utf16 offset, byte offset) of every char start, plus the end sentinel
    let mut bounds: Vec<(usize, usize)> = Vec::with_capacity(text.len() + 1);
    let mut unit = 0usize;
    for (byte, c) in text.char_indices() {
        bounds.push((unit, byte));
        unit += c.len_utf16();
    }
    let total_units = unit;
    bounds.push((total_units, text.len()));

    let mut spans: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for &(start, end) in ranges {
        if start >= total_units {
            continue;
        }
        let end = end.min(total_units - 1);

        // Char containing `start`, and the char after the one containing `end`
        let first = bounds.partition_point(|&(u, _)| u <= start) - 1;
        let after = bounds.partition_point(|&(u, _)| u <= end);
        let span = (bounds[first].1, bounds[after].1);

        match spans.last_mut() {
            Some(prev) if span.0 <= prev.1 => prev.1 = prev.1.max(span.1),
            _ => spans.push(span),
        }
    }
    spans
}
