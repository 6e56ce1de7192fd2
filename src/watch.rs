//! Interactive terminal search
//!
//! Each stdin line is the new value of the search box, `:clear` is the clear
//! button, and end of input closes the session. Rendered markup goes to the
//! output writer.

use std::io::Write;
use std::sync::Arc;

use futures::{future, Stream, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tracing::{debug, warn};

use crate::search::{InputEvent, LoadError, QueryController, SearchContext, SearchView};

pub const CLEAR_COMMAND: &str = ":clear";

/// Writes results and statistics as they change
pub struct TerminalView<W: Write> {
    out: W,
    input: String,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            input: String::new(),
        }
    }

    #[cfg(test)]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            warn!("Failed to write output: {}", e);
        }
    }
}

impl<W: Write> SearchView for TerminalView<W> {
    fn set_input(&mut self, value: &str) {
        self.input = value.to_string();
    }

    fn focus_input(&mut self) {
        debug!("Input focused");
    }

    fn set_results(&mut self, html: &str) {
        self.emit(html);
    }

    fn set_stats(&mut self, stats: &str) {
        self.emit(stats);
    }
}

pub fn parse_line(line: &str) -> InputEvent {
    if line.trim() == CLEAR_COMMAND {
        InputEvent::Clear
    } else {
        InputEvent::Input(line.to_string())
    }
}

/// Input events read line by line from stdin; a read error ends the stream
pub fn stdin_events() -> impl Stream<Item = InputEvent> + Unpin {
    let lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    Box::pin(
        lines
            .scan((), |_, line| future::ready(line.ok()))
            .map(|line| parse_line(&line)),
    )
}

/// Mount a controller on a terminal view, seed it from `page_url`, and drive
/// it with `events` until they end
pub async fn run<S, W>(
    loaded: Result<Arc<SearchContext>, LoadError>,
    page_url: Option<&str>,
    events: S,
    out: W,
) -> QueryController<TerminalView<W>>
where
    S: Stream<Item = InputEvent> + Unpin,
    W: Write,
{
    let mut controller = QueryController::mount(loaded, TerminalView::new(out));
    if let Some(url) = page_url {
        controller.seed_from_url(url);
    }
    controller.run(events).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::document::Document;
    use crate::search::render::LOAD_FAILURE_HTML;
    use futures::stream;

    fn context() -> Arc<SearchContext> {
        let docs = vec![Document {
            title: "Rust tips".to_string(),
            permalink: "/rust-tips/".to_string(),
            content: "Borrowing explained.".to_string(),
            date: "2024-02-01".to_string(),
            ..Default::default()
        }];
        Arc::new(SearchContext::new(docs, "memory"))
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line(":clear"), InputEvent::Clear);
        assert_eq!(parse_line("  :clear "), InputEvent::Clear);
        assert_eq!(parse_line("rust "), InputEvent::Input("rust ".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_seeded_session_writes_results() {
        let controller = run(
            Ok(context()),
            Some("https://example.com/search/?q=rust"),
            stream::empty::<InputEvent>(),
            Vec::<u8>::new(),
        )
        .await;

        assert_eq!(controller.searches_run(), 1);
        assert_eq!(controller.view().input(), "rust");
        let output = String::from_utf8(controller.into_view().into_inner()).unwrap();
        assert!(output.contains("href=\"/rust-tips/\""));
        assert!(output.contains("Found <span>1</span> result in"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_failure_prints_message() {
        let err = LoadError::Parse(serde_json::from_str::<Vec<Document>>("[").unwrap_err());
        let controller = run(
            Err(err),
            None,
            stream::empty::<InputEvent>(),
            Vec::<u8>::new(),
        )
        .await;

        let output = String::from_utf8(controller.into_view().into_inner()).unwrap();
        assert_eq!(output.trim(), LOAD_FAILURE_HTML);
    }
}
