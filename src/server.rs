//! HTTP server: server-rendered search plus the form relay

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{FromRef, Query, State},
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::info;

use crate::forms::{self, FormsState};
use crate::search::{search_and_render, SearchContext, LOAD_FAILURE_HTML};

#[derive(Debug, Clone)]
pub struct AppState {
    /// None when the index failed to load
    pub search: Option<Arc<SearchContext>>,
    pub forms: FormsState,
}

impl FromRef<AppState> for FormsState {
    fn from_ref(state: &AppState) -> Self {
        state.forms.clone()
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/search", get(search_handler))
        .merge(forms::routes())
        .with_state(state)
}

async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Html<String> {
    let Some(context) = state.search.as_ref() else {
        return Html(fragment("", LOAD_FAILURE_HTML));
    };

    let query = params.q.as_deref().map(str::trim).unwrap_or("");
    if query.is_empty() {
        return Html(fragment("", ""));
    }

    let rendered = search_and_render(context, query);
    Html(fragment(&rendered.stats, &rendered.results_html))
}

/// Statistics and results containers as one fragment
pub fn fragment(stats: &str, results: &str) -> String {
    format!(
        "<div id=\"search-stats\">{}</div><div id=\"search-results\">{}</div>",
        stats, results
    )
}

/// Bind and serve until the process is stopped
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    let local = listener.local_addr().context("Failed to read bound address")?;
    info!("Serving search on http://{}/search", local);

    axum::serve(listener, router(state))
        .await
        .context("Server error")
}
