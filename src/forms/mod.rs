//! Form relay
//!
//! Contact and newsletter endpoints. Each accepts a JSON body, validates it,
//! and forwards it to a third-party API with credentials the browser never
//! sees.

pub mod contact;
pub mod subscribe;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde_json::json;

use crate::config::FormsConfig;

pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";

/// State shared by the form handlers
#[derive(Debug, Clone)]
pub struct FormsState {
    pub config: Arc<FormsConfig>,
    pub client: reqwest::Client,
}

impl FormsState {
    pub fn new(config: FormsConfig, client: reqwest::Client) -> Self {
        Self {
            config: Arc::new(config),
            client,
        }
    }
}

/// `/api/contact` and `/api/subscribe`, mounted on any router whose state
/// provides [`FormsState`]
pub fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    FormsState: FromRef<S>,
{
    Router::new()
        .route("/api/contact", any(contact::handle))
        .route("/api/subscribe", any(subscribe::handle))
}

pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

pub(crate) fn success_response(message: &str) -> Response {
    (StatusCode::OK, Json(json!({ "success": true, "message": message }))).into_response()
}

pub(crate) fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED)
}

/// Field present and non-empty
pub(crate) fn provided(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
