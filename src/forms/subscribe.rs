//! Newsletter signup: relays an email address to a ConvertKit form

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::Response,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use super::{error_response, method_not_allowed, success_response, FormsState};
use crate::config::FormsConfig;
use crate::error::AppError;

pub const EMAIL_REQUIRED: &str = "Valid email is required";
pub const SUBSCRIBE_FAILED: &str = "Subscription failed. Please try again.";
pub const SUBSCRIBED: &str = "Successfully subscribed!";

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

pub async fn handle(State(state): State<FormsState>, method: Method, body: Bytes) -> Response {
    if method != Method::POST {
        return method_not_allowed();
    }

    let request: SubscribeRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            error!("Subscription error: malformed body: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, SUBSCRIBE_FAILED);
        }
    };

    let Some(email) = request.email.as_deref().filter(|e| e.contains('@')) else {
        return error_response(StatusCode::BAD_REQUEST, EMAIL_REQUIRED);
    };
    let first_name = request.first_name.as_deref().unwrap_or("");

    match subscribe(&state.client, &state.config, email, first_name).await {
        Ok(()) => {
            info!("Newsletter subscription relayed");
            success_response(SUBSCRIBED)
        }
        Err(e) => {
            error!("Subscription error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, SUBSCRIBE_FAILED)
        }
    }
}

/// `{base}/forms/{id}/subscribe`
pub fn subscribe_url(config: &FormsConfig, form_id: &str) -> String {
    format!(
        "{}/forms/{}/subscribe",
        config.convertkit_url.trim_end_matches('/'),
        form_id
    )
}

async fn subscribe(
    client: &reqwest::Client,
    config: &FormsConfig,
    email: &str,
    first_name: &str,
) -> Result<(), AppError> {
    let api_key = config
        .convertkit_api_key
        .as_deref()
        .ok_or_else(|| AppError::Config("CONVERTKIT_API_KEY is not set".to_string()))?;
    let form_id = config
        .convertkit_form_id
        .as_deref()
        .ok_or_else(|| AppError::Config("CONVERTKIT_FORM_ID is not set".to_string()))?;

    let response = client
        .post(subscribe_url(config, form_id))
        .json(&json!({
            "api_key": api_key,
            "email": email,
            "first_name": first_name,
        }))
        .send()
        .await?;

    let status = response.status();
    let data: Value = response.json().await?;

    if !status.is_success() {
        let message = data
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Subscription failed");
        return Err(AppError::UpstreamFailed(format!("{} ({})", message, status)));
    }

    Ok(())
}
