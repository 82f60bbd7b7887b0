//! Conversation rendering
//!
//! Builds escaped message entries, keeps the list scrolled to its newest entry
//! and drives the single-slot error banner.

use crate::escape::escape_html;
use crate::surface::Surface;
use crate::widget::INPUT_ID;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt::Write;

const FALLBACK_TIMESTAMP_FORMAT: &str = "%H:%M";

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn css_class(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

/// A rendered conversation entry. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    /// Display-formatted local time
    pub timestamp: String,
    pub is_error: bool,
}

/// Markup-ready form of a [`Message`] handed to the surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageNode {
    pub id: String,
    pub sender: Sender,
    /// Message text, HTML-escaped
    pub body_html: String,
    pub timestamp: String,
    pub is_error: bool,
}

impl From<&Message> for MessageNode {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            sender: message.sender,
            body_html: escape_html(&message.text),
            timestamp: escape_html(&message.timestamp),
            is_error: message.is_error,
        }
    }
}

/// Presentation layer over a [`Surface`]
pub struct ConversationView<S> {
    surface: S,
    timestamp_format: String,
}

impl<S: Surface> ConversationView<S> {
    pub fn new(surface: S, timestamp_format: impl Into<String>) -> Self {
        Self {
            surface,
            timestamp_format: timestamp_format.into(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Append a message stamped with the current local time
    pub fn append_message(&mut self, text: &str, sender: Sender, is_error: bool) -> Message {
        self.append_message_at(text, sender, is_error, Local::now())
    }

    pub fn append_message_at(
        &mut self,
        text: &str,
        sender: Sender,
        is_error: bool,
        at: DateTime<Local>,
    ) -> Message {
        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.to_string(),
            sender,
            timestamp: self.format_timestamp(at),
            is_error,
        };

        self.surface.append_message(MessageNode::from(&message));
        self.scroll_to_bottom();
        message
    }

    /// Replace whatever the banner shows
    pub fn show_error_banner(&mut self, message: &str) {
        self.surface.set_error_banner(Some(message));
    }

    pub fn hide_error_banner(&mut self) {
        self.surface.set_error_banner(None);
    }

    pub fn set_pending(&mut self, visible: bool) {
        self.surface.set_pending_visible(visible);
    }

    pub fn set_window_open(&mut self, open: bool) {
        self.surface.set_window_open(open);
    }

    pub fn focus_input(&mut self) {
        self.surface.focus(INPUT_ID);
    }

    pub fn clear_input(&mut self) {
        self.surface.set_input_value("");
    }

    fn scroll_to_bottom(&mut self) {
        let bottom = self.surface.max_scroll_offset();
        self.surface.set_scroll_offset(bottom);
    }

    fn format_timestamp(&self, at: DateTime<Local>) -> String {
        let mut out = String::new();
        if write!(out, "{}", at.format(&self.timestamp_format)).is_err() {
            out.clear();
            // Infallible: the fallback format is known to be valid
            let _ = write!(out, "{}", at.format(FALLBACK_TIMESTAMP_FORMAT));
        }
        out
    }
}
