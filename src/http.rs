//! HTTP client utilities
//!
//! One reqwest::Client serves index fetches and the form relay's upstream
//! calls. Proxies come from reqwest's own environment handling
//! (HTTP_PROXY, HTTPS_PROXY, NO_PROXY).

use reqwest::Client;
use std::time::Duration;

use crate::error::AppError;

/// Default timeout for index fetches and upstream form calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub const USER_AGENT: &str = concat!("sitesearch/", env!("CARGO_PKG_VERSION"));

/// Build a reqwest Client with the given timeout
pub fn client_with_timeout(timeout: Duration) -> Result<Client, AppError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))
}
