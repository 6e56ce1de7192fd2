//! Contact form: relays a message to the site owner through SendGrid

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::Response,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use super::{error_response, method_not_allowed, provided, success_response, FormsState};
use crate::config::FormsConfig;
use crate::error::AppError;

pub const SUBJECT: &str = "New Contact Form Submission";
pub const FIELDS_REQUIRED: &str = "All fields are required";
pub const SEND_FAILED: &str = "Failed to send message. Please try again.";
pub const SENT: &str = "Message sent successfully!";

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

pub async fn handle(State(state): State<FormsState>, method: Method, body: Bytes) -> Response {
    if method != Method::POST {
        return method_not_allowed();
    }

    let request: ContactRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            error!("Contact form error: malformed body: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, SEND_FAILED);
        }
    };

    let (Some(name), Some(email), Some(message)) = (
        provided(&request.name),
        provided(&request.email),
        provided(&request.message),
    ) else {
        return error_response(StatusCode::BAD_REQUEST, FIELDS_REQUIRED);
    };

    match send_mail(&state.client, &state.config, name, email, message).await {
        Ok(()) => {
            info!("Contact message relayed");
            success_response(SENT)
        }
        Err(e) => {
            error!("Contact form error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, SEND_FAILED)
        }
    }
}

/// SendGrid v3 `mail/send` payload
pub fn mail_payload(
    config: &FormsConfig,
    to: &str,
    name: &str,
    email: &str,
    message: &str,
) -> serde_json::Value {
    json!({
        "personalizations": [{
            "to": [{ "email": to }],
            "subject": SUBJECT,
        }],
        "from": { "email": config.contact_from },
        "content": [{
            "type": "text/plain",
            "value": format!("Name: {}\nEmail: {}\n\nMessage:\n{}", name, email, message),
        }],
    })
}

async fn send_mail(
    client: &reqwest::Client,
    config: &FormsConfig,
    name: &str,
    email: &str,
    message: &str,
) -> Result<(), AppError> {
    let api_key = config
        .sendgrid_api_key
        .as_deref()
        .ok_or_else(|| AppError::Config("SENDGRID_API_KEY is not set".to_string()))?;
    let to = config
        .contact_email
        .as_deref()
        .ok_or_else(|| AppError::Config("CONTACT_EMAIL is not set".to_string()))?;

    let response = client
        .post(&config.sendgrid_url)
        .bearer_auth(api_key)
        .json(&mail_payload(config, to, name, email, message))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(AppError::UpstreamFailed(format!(
            "Email send failed with status {}",
            response.status()
        )));
    }

    Ok(())
}
