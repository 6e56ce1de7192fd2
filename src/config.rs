//! Site configuration
//!
//! Read from a JSON file (explicit path, or `sitesearch/config.json` under the
//! user config directory), then overridden by environment variables. CLI flags
//! are applied last by `main`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::http::DEFAULT_TIMEOUT;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";
pub const DEFAULT_CONVERTKIT_URL: &str = "https://api.convertkit.com/v3";
pub const DEFAULT_CONTACT_FROM: &str = "noreply@yourdomain.com";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Index location: URL or file path
    pub index: Option<String>,
    /// Server listen address
    pub bind: String,
    /// Timeout for outbound HTTP requests, seconds
    pub timeout_secs: u64,
    pub forms: FormsConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            index: None,
            bind: DEFAULT_BIND.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            forms: FormsConfig::default(),
        }
    }
}

/// Credentials and endpoints of the form relay upstreams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormsConfig {
    pub sendgrid_api_key: Option<String>,
    pub sendgrid_url: String,
    /// Where contact messages are delivered
    pub contact_email: Option<String>,
    pub contact_from: String,
    pub convertkit_api_key: Option<String>,
    pub convertkit_form_id: Option<String>,
    pub convertkit_url: String,
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            sendgrid_api_key: None,
            sendgrid_url: DEFAULT_SENDGRID_URL.to_string(),
            contact_email: None,
            contact_from: DEFAULT_CONTACT_FROM.to_string(),
            convertkit_api_key: None,
            convertkit_form_id: None,
            convertkit_url: DEFAULT_CONVERTKIT_URL.to_string(),
        }
    }
}

/// Default location of the configuration file
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Cannot determine config directory")?;
    Ok(config_dir.join("sitesearch").join("config.json"))
}

/// Load configuration from `path`, or from the default location
///
/// An explicit path must exist; a missing default file yields defaults.
pub fn load_config(path: Option<&Path>) -> Result<SiteConfig> {
    let config = match path {
        Some(path) => read_config(path)?,
        None => match config_path() {
            Ok(path) if path.exists() => read_config(&path)?,
            _ => SiteConfig::default(),
        },
    };
    Ok(config.apply_env())
}

fn read_config(path: &Path) -> Result<SiteConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

impl SiteConfig {
    /// Override settings from the process environment
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Override settings from any variable lookup; blank values are ignored
    pub fn apply_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SITESEARCH_INDEX") {
            self.index = Some(v);
        }
        if let Some(v) = get("SITESEARCH_BIND") {
            self.bind = v;
        }

        let forms = &mut self.forms;
        if let Some(v) = get("SENDGRID_API_KEY") {
            forms.sendgrid_api_key = Some(v);
        }
        if let Some(v) = get("SENDGRID_URL") {
            forms.sendgrid_url = v;
        }
        if let Some(v) = get("CONTACT_EMAIL") {
            forms.contact_email = Some(v);
        }
        if let Some(v) = get("CONTACT_FROM") {
            forms.contact_from = v;
        }
        if let Some(v) = get("CONVERTKIT_API_KEY") {
            forms.convertkit_api_key = Some(v);
        }
        if let Some(v) = get("CONVERTKIT_FORM_ID") {
            forms.convertkit_form_id = Some(v);
        }
        if let Some(v) = get("CONVERTKIT_URL") {
            forms.convertkit_url = v;
        }

        self
    }
}
