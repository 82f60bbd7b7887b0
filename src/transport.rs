//! Remote call transport
//!
//! The widget sees the backend only through [`RemoteCall`]: one asynchronous
//! call that yields either a structured payload or a transport failure.

use crate::classifier::RawResponse;
use crate::config::FrappeConfig;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Longest slice of an error body kept in a transport error message
const BODY_SNIPPET_CHARS: usize = 200;

/// Arguments of one chat remote call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingRequest {
    pub message_text: String,
}

impl OutgoingRequest {
    /// Build a request from raw input. Returns `None` for empty or whitespace-only input.
    pub fn from_input(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self {
                message_text: trimmed.to_string(),
            })
        }
    }
}

/// Transport failure: the call did not produce a structured payload
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused, DNS failure, reset
    Connect,
    /// HTTP client gave up waiting
    Timeout,
    /// Error status without a structured body
    Status,
    /// Body was not a JSON object
    Decode,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    pub fn status(status: StatusCode, body: &str) -> Self {
        Self::new(
            TransportErrorKind::Status,
            format!("HTTP {status}: {}", snippet(body)),
        )
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Decode, message)
    }

    fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else {
            Self::connect(error.to_string())
        }
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_CHARS).collect()
}

/// Host mechanism for invoking a backend operation
#[async_trait]
pub trait RemoteCall: Send + Sync {
    async fn call(
        &self,
        method: &str,
        request: &OutgoingRequest,
    ) -> Result<RawResponse, TransportError>;
}

#[async_trait]
impl<T: RemoteCall + ?Sized> RemoteCall for Arc<T> {
    async fn call(
        &self,
        method: &str,
        request: &OutgoingRequest,
    ) -> Result<RawResponse, TransportError> {
        (**self).call(method, request).await
    }
}

// ============================================================================
// Logging wrapper
// ============================================================================

/// Logs duration and result of every call made through the inner transport
pub struct LoggingTransport<T> {
    inner: T,
}

impl<T: RemoteCall> LoggingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: RemoteCall> RemoteCall for LoggingTransport<T> {
    async fn call(
        &self,
        method: &str,
        request: &OutgoingRequest,
    ) -> Result<RawResponse, TransportError> {
        let start = Instant::now();
        let result = self.inner.call(method, request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    method = %method,
                    duration_ms = %duration.as_millis(),
                    has_exc = response.exc.is_some(),
                    "Remote call completed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    method = %method,
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    error = %e.message,
                    "Remote call failed"
                );
            }
        }

        result
    }
}

// ============================================================================
// Frappe HTTP transport
// ============================================================================

/// Calls whitelisted methods on a Frappe site over `/api/method/`
pub struct FrappeTransport {
    client: Client,
    config: FrappeConfig,
}

impl FrappeTransport {
    pub fn new(config: FrappeConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| TransportError::connect(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/api/method/{method}",
            self.config.site_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl RemoteCall for FrappeTransport {
    async fn call(
        &self,
        method: &str,
        request: &OutgoingRequest,
    ) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .post(self.endpoint(method))
            .header(ACCEPT, "application/json")
            .json(request);

        if let Some(auth) = self.config.authorization() {
            builder = builder.header(AUTHORIZATION, auth);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;

        // Frappe reports server-side exceptions as a JSON object with an
        // error status, so any object body is a structured payload.
        match serde_json::from_str::<Value>(&body) {
            Ok(value @ Value::Object(_)) => serde_json::from_value(value)
                .map_err(|e| TransportError::decode(format!("unexpected payload: {e}"))),
            _ if !status.is_success() => Err(TransportError::status(status, &body)),
            Ok(_) => Err(TransportError::decode(format!(
                "expected a JSON object, got: {}",
                snippet(&body)
            ))),
            Err(e) => Err(TransportError::decode(format!("invalid JSON body: {e}"))),
        }
    }
}
