//! Backend response classification
//!
//! Turns whatever the remote call delivered into exactly one [`ResponseOutcome`].
//! Classification is pure and total: malformed payloads degrade to a generic
//! outcome instead of failing.

#[cfg(test)]
mod proptests;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Substring of a backend exception that identifies a missing webhook configuration
pub const CONFIG_ERROR_MARKER: &str = "N8N_WEBHOOK_URL not configured";

pub const CONFIG_ERROR_MESSAGE: &str =
    "Chat service is not configured. Please contact administrator.";
pub const UNEXPECTED_ERROR_MESSAGE: &str =
    "An unexpected error occurred. See console for details.";
pub const NETWORK_ERROR_MESSAGE: &str = "Error connecting to server. Please try again.";
pub const UNRECOGNIZED_MESSAGE: &str = "Sorry, I could not process your request.";

/// Raw payload delivered by the host's remote-call mechanism
///
/// Recognized shapes are `{"message": {"reply": ..}}`, `{"message": {"error": ..}}`
/// and `{"exc": "<json array>"}`. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exc: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exc_type: Option<String>,
}

impl RawResponse {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            message: Some(serde_json::json!({ "reply": text.into() })),
            ..Self::default()
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            message: Some(serde_json::json!({ "error": text.into() })),
            ..Self::default()
        }
    }

    pub fn exception(raw: impl Into<String>) -> Self {
        Self {
            exc: Some(Value::String(raw.into())),
            ..Self::default()
        }
    }
}

/// Classified result of one remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Backend produced a reply
    Success { reply: String },
    /// Backend reported a handled error; `message` is already prefixed with `"Error: "`
    ApplicationError { message: String },
    /// Backend raised because the chat webhook is not configured
    ConfigurationError,
    /// Any other backend exception; `raw_detail` is for the diagnostic log only
    UnexpectedException { raw_detail: String },
    /// The call itself did not complete; `detail` is for the diagnostic log only
    NetworkFailure { detail: String },
    /// None of reply, error or exception were present
    Unrecognized,
}

impl ResponseOutcome {
    pub fn network_failure(detail: impl Into<String>) -> Self {
        ResponseOutcome::NetworkFailure {
            detail: detail.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, ResponseOutcome::Success { .. })
    }

    /// Text shown to the user for this outcome
    pub fn user_message(&self) -> &str {
        match self {
            ResponseOutcome::Success { reply } => reply,
            ResponseOutcome::ApplicationError { message } => message,
            ResponseOutcome::ConfigurationError => CONFIG_ERROR_MESSAGE,
            ResponseOutcome::UnexpectedException { .. } => UNEXPECTED_ERROR_MESSAGE,
            ResponseOutcome::NetworkFailure { .. } => NETWORK_ERROR_MESSAGE,
            ResponseOutcome::Unrecognized => UNRECOGNIZED_MESSAGE,
        }
    }

    /// Label and detail destined for the diagnostic log, if this outcome carries any
    pub fn diagnostic(&self) -> Option<(&'static str, &str)> {
        match self {
            ResponseOutcome::UnexpectedException { raw_detail } => {
                Some(("Nexchat Error", raw_detail))
            }
            ResponseOutcome::NetworkFailure { detail } => Some(("Nexchat AJAX Error", detail)),
            _ => None,
        }
    }
}

/// Classify a raw backend response. First match wins:
/// reply, then error, then exception, then unrecognized.
pub fn classify(response: &RawResponse) -> ResponseOutcome {
    let body = response.message.as_ref();

    if let Some(reply) = body.and_then(|m| field_text(m, "reply")) {
        return ResponseOutcome::Success { reply };
    }

    if let Some(error) = body.and_then(|m| field_text(m, "error")) {
        return ResponseOutcome::ApplicationError {
            message: format!("Error: {error}"),
        };
    }

    if let Some(raw) = response.exc.as_ref().and_then(truthy_text) {
        return classify_exception(raw);
    }

    ResponseOutcome::Unrecognized
}

fn classify_exception(raw: String) -> ResponseOutcome {
    // Only the first entry matters; a payload that is not a JSON array has no marker
    let missing_webhook = parse_exception_payload(&raw).is_ok_and(|entries| {
        entries
            .first()
            .and_then(Value::as_str)
            .is_some_and(|first| first.contains(CONFIG_ERROR_MARKER))
    });

    if missing_webhook {
        ResponseOutcome::ConfigurationError
    } else {
        ResponseOutcome::UnexpectedException { raw_detail: raw }
    }
}

/// Parse a backend exception payload, a JSON-encoded array of traceback entries
pub fn parse_exception_payload(raw: &str) -> Result<Vec<Value>, serde_json::Error> {
    serde_json::from_str(raw)
}

fn field_text(body: &Value, key: &str) -> Option<String> {
    body.get(key).and_then(truthy_text)
}

/// Text of a value the host would treat as present: non-empty strings,
/// non-zero numbers, `true`, arrays and objects.
fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
        _ => None,
    }
}
