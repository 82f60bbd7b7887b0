//! Effects produced by state transitions

use super::state::RequestId;
use crate::transport::OutgoingRequest;
use crate::view::Sender;

/// Effects to be executed after state transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SetWindowOpen { open: bool },

    FocusInput,

    /// Render a conversation entry
    AppendMessage {
        text: String,
        sender: Sender,
        is_error: bool,
    },

    ClearInput,

    ShowPending,

    HidePending,

    ShowErrorBanner { message: String },

    HideErrorBanner,

    /// Issue the remote call; its completion comes back as an event
    CallRemote {
        request_id: RequestId,
        request: OutgoingRequest,
    },

    /// Write detail to the diagnostic log, never to the user
    LogDiagnostic { summary: &'static str, detail: String },
}

impl Effect {
    pub fn user_message(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            text: text.into(),
            sender: Sender::User,
            is_error: false,
        }
    }

    pub fn bot_message(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            text: text.into(),
            sender: Sender::Bot,
            is_error: false,
        }
    }

    pub fn bot_error(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            text: text.into(),
            sender: Sender::Bot,
            is_error: true,
        }
    }
}
