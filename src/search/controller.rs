//! Debounced query controller
//!
//! Owns the view and the loaded search context, turns input events into
//! searches. Keystrokes settle for [`DEBOUNCE_DELAY`] before a search runs;
//! each new keystroke replaces the pending search.

use std::future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::time::{sleep, Sleep};
use tracing::{debug, info, warn};

use super::context::{query_from_url, LoadError, SearchContext};
use super::render::{search_and_render, RenderedSearch, LOAD_FAILURE_HTML};

pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(300);

/// Something the user did to the search box
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// New full value of the input control
    Input(String),
    /// The clear button
    Clear,
}

/// Display surface the controller drives
pub trait SearchView {
    fn set_input(&mut self, value: &str);
    fn focus_input(&mut self);
    fn set_results(&mut self, html: &str);
    /// Views without a statistics line ignore this
    fn set_stats(&mut self, _stats: &str) {}
}

struct Pending {
    query: String,
    timer: Pin<Box<Sleep>>,
}

/// Single-slot cancellable delay
pub struct Debouncer {
    delay: Duration,
    pending: Option<Pending>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedule `query`, replacing whatever was pending
    pub fn schedule(&mut self, query: String) {
        self.pending = Some(Pending {
            query,
            timer: Box::pin(sleep(self.delay)),
        });
    }

    /// Drop the pending query; returns whether there was one
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Resolves with the pending query once its delay has elapsed
    ///
    /// Never resolves while nothing is pending. Dropping the future before it
    /// resolves leaves the pending query in place.
    pub async fn fired(&mut self) -> String {
        let Some(pending) = self.pending.as_mut() else {
            return future::pending().await;
        };
        pending.timer.as_mut().await;
        self.pending
            .take()
            .map(|pending| pending.query)
            .unwrap_or_default()
    }
}

enum Step {
    Fire(String),
    Event(InputEvent),
    Done,
}

pub struct QueryController<V: SearchView> {
    context: Option<Arc<SearchContext>>,
    view: V,
    debouncer: Debouncer,
    searches_run: usize,
    last_query: Option<String>,
}

impl<V: SearchView> QueryController<V> {
    /// Attach to the view with the outcome of the index load
    ///
    /// A failed load shows the failure message and disables searching.
    pub fn mount(loaded: Result<Arc<SearchContext>, LoadError>, mut view: V) -> Self {
        let context = match loaded {
            Ok(context) => Some(context),
            Err(err) => {
                warn!("Search disabled: {}", err);
                view.set_results(LOAD_FAILURE_HTML);
                None
            }
        };

        Self {
            context,
            view,
            debouncer: Debouncer::new(DEBOUNCE_DELAY),
            searches_run: 0,
            last_query: None,
        }
    }

    #[cfg(test)]
    pub fn is_enabled(&self) -> bool {
        self.context.is_some()
    }

    #[cfg(test)]
    pub fn view(&self) -> &V {
        &self.view
    }

    #[cfg(test)]
    pub fn into_view(self) -> V {
        self.view
    }

    pub fn searches_run(&self) -> usize {
        self.searches_run
    }

    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    /// Pre-fill from the page's `q` parameter and search right away
    pub fn seed_from_url(&mut self, page_url: &str) -> Option<RenderedSearch> {
        if self.context.is_none() {
            return None;
        }
        let query = query_from_url(page_url)?;
        debug!("Seeding search from URL: {:?}", query);
        self.view.set_input(&query);
        self.perform_search(query.trim())
    }

    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::Input(value) => {
                self.debouncer.cancel();
                let query = value.trim();
                if query.is_empty() {
                    self.clear_output();
                } else if self.context.is_some() {
                    self.debouncer.schedule(query.to_string());
                }
            }
            InputEvent::Clear => {
                self.debouncer.cancel();
                self.view.set_input("");
                self.clear_output();
                self.view.focus_input();
            }
        }
    }

    /// Run one search now and push the output to the view
    pub fn perform_search(&mut self, query: &str) -> Option<RenderedSearch> {
        let context = self.context.as_ref()?;
        let rendered = search_and_render(context, query);

        self.view.set_results(&rendered.results_html);
        self.view.set_stats(&rendered.stats);
        self.searches_run += 1;
        self.last_query = Some(query.to_string());

        info!("Search {:?}: {} results", rendered.query, rendered.result_count);
        Some(rendered)
    }

    /// Drive the controller until the event stream ends
    ///
    /// A search still pending when the stream ends is dropped.
    pub async fn run<S>(mut self, mut events: S) -> Self
    where
        S: Stream<Item = InputEvent> + Unpin,
    {
        loop {
            let step = tokio::select! {
                biased;
                query = self.debouncer.fired() => Step::Fire(query),
                event = events.next() => match event {
                    Some(event) => Step::Event(event),
                    None => Step::Done,
                },
            };

            match step {
                Step::Fire(query) => {
                    self.perform_search(&query);
                }
                Step::Event(event) => self.handle(event),
                Step::Done => break,
            }
        }

        if self.debouncer.cancel() {
            debug!("Input closed with a search pending; dropped");
        }
        self
    }

    fn clear_output(&mut self) {
        self.view.set_results("");
        self.view.set_stats("");
    }
}
