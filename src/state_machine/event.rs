//! Events that can occur in a widget

use super::state::RequestId;
use crate::classifier::RawResponse;
use std::time::Duration;

/// Keys the input field reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other,
}

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // UI events
    TriggerClicked,
    CloseClicked,
    InputChanged {
        value: String,
    },
    /// Send button clicked
    Submit,
    KeyPressed {
        key: Key,
        shift: bool,
    },

    // Remote call events
    RemoteCompleted {
        request_id: RequestId,
        response: RawResponse,
    },
    RemoteFailed {
        request_id: RequestId,
        detail: String,
    },
    RemoteTimedOut {
        request_id: RequestId,
        after: Duration,
    },
}
