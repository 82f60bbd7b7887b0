//! Widget and transport configuration

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Backend operation invoked for every message
pub const DEFAULT_METHOD: &str = "nexchat.api.send_message_to_n8n";

/// Default remote call timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid widget config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Host-supplied widget settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Remote operation identifier
    pub method: String,
    /// Allow a new send while an earlier one is still in flight
    pub allow_concurrent_sends: bool,
    /// Remote call timeout; `None` waits forever
    pub request_timeout_secs: Option<u64>,
    pub title: String,
    /// First bot message shown when the widget is mounted (empty for none)
    pub greeting: String,
    pub placeholder: String,
    pub pending_label: String,
    pub trigger_tooltip: String,
    /// strftime format for message timestamps
    ///
    /// Replaces locale-dependent formatting: the default is a 24-hour
    /// `HH:MM` clock, and hosts that want a 12-hour clock set `"%I:%M %p"`.
    pub timestamp_format: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            method: DEFAULT_METHOD.to_string(),
            allow_concurrent_sends: false,
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
            title: "NexChat Assistant".to_string(),
            greeting: "Hello! How can I assist you today?".to_string(),
            placeholder: "Type your message...".to_string(),
            pending_label: "Typing...".to_string(),
            trigger_tooltip: "Chat with Support".to_string(),
            timestamp_format: "%H:%M".to_string(),
        }
    }
}

impl WidgetConfig {
    /// Parse and validate settings passed by the host page
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.method.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "method",
                reason: "must not be empty".to_string(),
            });
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                reason: "must be positive (omit it to disable the timeout)".to_string(),
            });
        }
        if StrftimeItems::new(&self.timestamp_format).any(|item| item == Item::Error) {
            return Err(ConfigError::Invalid {
                field: "timestamp_format",
                reason: format!("unsupported strftime format {:?}", self.timestamp_format),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Connection settings for a Frappe site exposing the chat method
#[derive(Debug, Clone)]
pub struct FrappeConfig {
    pub site_url: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub http_timeout: Duration,
}

impl FrappeConfig {
    pub fn new(site_url: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            api_key: None,
            api_secret: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self.api_secret = Some(api_secret.into());
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let site_url = std::env::var("NEXCHAT_SITE_URL")
            .map_err(|_| ConfigError::MissingEnv("NEXCHAT_SITE_URL"))?;

        let http_timeout = match std::env::var("NEXCHAT_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::Invalid {
                    field: "NEXCHAT_HTTP_TIMEOUT_SECS",
                    reason: e.to_string(),
                })?,
            Err(_) => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            site_url,
            api_key: std::env::var("NEXCHAT_API_KEY").ok(),
            api_secret: std::env::var("NEXCHAT_API_SECRET").ok(),
            http_timeout,
        })
    }

    /// `Authorization` header value for token auth, when both halves are set
    pub fn authorization(&self) -> Option<String> {
        match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some(format!("token {key}:{secret}"))
            }
            _ => None,
        }
    }
}
