//! Runtime for executing widgets
//!
//! Each mounted widget owns one event loop. UI bindings and finished remote
//! calls feed [`Event`]s into it; the loop runs the pure transition and
//! carries out the resulting effects against the page.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::{WidgetRuntime, DIAGNOSTIC_TARGET};

use crate::state_machine::{Event, Key};
use crate::view::Message;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Rendering changes broadcast to observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    WindowChanged { open: bool },
    MessageAppended(Message),
    PendingChanged { visible: bool },
    ErrorBanner { message: Option<String> },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("widget runtime is no longer running")]
    Stopped,
}

/// Handle for feeding UI events into a running widget
#[derive(Clone)]
pub struct WidgetHandle {
    event_tx: mpsc::Sender<Event>,
    notify_tx: broadcast::Sender<Notification>,
    cancel: CancellationToken,
}

impl WidgetHandle {
    pub(crate) fn new(
        event_tx: mpsc::Sender<Event>,
        notify_tx: broadcast::Sender<Notification>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            event_tx,
            notify_tx,
            cancel,
        }
    }

    pub async fn dispatch(&self, event: Event) -> Result<(), RuntimeError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| RuntimeError::Stopped)
    }

    pub async fn click_trigger(&self) -> Result<(), RuntimeError> {
        self.dispatch(Event::TriggerClicked).await
    }

    pub async fn click_close(&self) -> Result<(), RuntimeError> {
        self.dispatch(Event::CloseClicked).await
    }

    /// Replace the contents of the input field
    pub async fn type_text(&self, value: impl Into<String>) -> Result<(), RuntimeError> {
        self.dispatch(Event::InputChanged {
            value: value.into(),
        })
        .await
    }

    pub async fn click_send(&self) -> Result<(), RuntimeError> {
        self.dispatch(Event::Submit).await
    }

    pub async fn key_press(&self, key: Key, shift: bool) -> Result<(), RuntimeError> {
        self.dispatch(Event::KeyPressed { key, shift }).await
    }

    /// Type `text` and press the send button
    pub async fn send(&self, text: impl Into<String>) -> Result<(), RuntimeError> {
        self.type_text(text).await?;
        self.click_send().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notify_tx.subscribe()
    }

    /// Stop the event loop and abandon in-flight calls
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.event_tx.is_closed()
    }
}
