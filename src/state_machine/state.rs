//! Widget state types

use crate::config::WidgetConfig;
use std::collections::BTreeSet;
use std::time::Duration;

/// Identifier of one remote call, unique within a widget
pub type RequestId = u64;

/// Visibility of the conversation window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowState {
    #[default]
    Closed,
    Open,
}

impl WindowState {
    pub fn is_open(self) -> bool {
        matches!(self, WindowState::Open)
    }
}

/// Everything the widget remembers between events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetState {
    pub window: WindowState,
    /// Current contents of the message input field
    pub input: String,
    /// Remote calls issued and not yet resolved
    pub in_flight: BTreeSet<RequestId>,
    pub next_request_id: RequestId,
}

impl WidgetState {
    /// Check if any remote call is outstanding
    pub fn is_pending(&self) -> bool {
        !self.in_flight.is_empty()
    }
}

/// Immutable configuration consulted by transitions
#[derive(Debug, Clone)]
pub struct WidgetContext {
    /// Backend operation identifier
    pub method: String,
    pub allow_concurrent_sends: bool,
    pub request_timeout: Option<Duration>,
}

impl WidgetContext {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            allow_concurrent_sends: false,
            request_timeout: None,
        }
    }
}

impl From<&WidgetConfig> for WidgetContext {
    fn from(config: &WidgetConfig) -> Self {
        Self {
            method: config.method.clone(),
            allow_concurrent_sends: config.allow_concurrent_sends,
            request_timeout: config.request_timeout(),
        }
    }
}
