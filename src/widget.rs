//! Widget mounting
//!
//! Injects the widget structure into a page exactly once, wires the UI
//! bindings and starts the widget's event loop.

use crate::config::WidgetConfig;
use crate::runtime::{Notification, WidgetHandle, WidgetRuntime};
use crate::state_machine::WidgetContext;
use crate::surface::Surface;
use crate::transport::RemoteCall;
use crate::view::ConversationView;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const TRIGGER_ID: &str = "nexchat-floating-button";
pub const WINDOW_ID: &str = "nexchat-window";
pub const MESSAGES_ID: &str = "nexchat-messages";
pub const INPUT_ID: &str = "nexchat-message-input";
pub const SEND_BUTTON_ID: &str = "nexchat-send-button";
pub const PENDING_ID: &str = "nexchat-loading-indicator";
pub const ERROR_BANNER_ID: &str = "nexchat-error-message";
pub const CLOSE_BUTTON_CLASS: &str = "nexchat-close-btn";

const EVENT_CHANNEL_CAPACITY: usize = 32;
const NOTIFICATION_CAPACITY: usize = 128;

/// Static texts of the injected widget structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton {
    pub title: String,
    pub greeting: String,
    pub placeholder: String,
    pub pending_label: String,
    pub trigger_tooltip: String,
}

impl Skeleton {
    pub fn from_config(config: &WidgetConfig) -> Self {
        Self {
            title: config.title.clone(),
            greeting: config.greeting.clone(),
            placeholder: config.placeholder.clone(),
            pending_label: config.pending_label.clone(),
            trigger_tooltip: config.trigger_tooltip.clone(),
        }
    }
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::from_config(&WidgetConfig::default())
    }
}

/// UI triggers wired at mount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Click on the floating trigger toggles the window
    TriggerClick,
    /// Click on the header close button
    CloseClick,
    SendClick,
    /// Enter (without Shift) in the input field
    InputEnterKey,
}

impl Binding {
    pub const ALL: [Binding; 4] = [
        Binding::TriggerClick,
        Binding::CloseClick,
        Binding::SendClick,
        Binding::InputEnterKey,
    ];
}

/// A mounted widget and its running event loop
pub struct Widget {
    pub handle: WidgetHandle,
    pub task: JoinHandle<()>,
}

pub enum MountOutcome {
    Mounted(Widget),
    /// The page already carries a widget; nothing was injected
    AlreadyMounted,
}

impl MountOutcome {
    pub fn into_widget(self) -> Option<Widget> {
        match self {
            MountOutcome::Mounted(widget) => Some(widget),
            MountOutcome::AlreadyMounted => None,
        }
    }
}

/// Mounts widgets backed by one transport
pub struct WidgetInitializer<T> {
    config: WidgetConfig,
    transport: Arc<T>,
}

impl<T: RemoteCall + 'static> WidgetInitializer<T> {
    pub fn new(config: WidgetConfig, transport: Arc<T>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Inject the widget into `surface` unless it already has one
    ///
    /// Must be called from within a tokio runtime; the event loop is spawned
    /// onto it.
    pub fn mount<S: Surface + 'static>(&self, mut surface: S) -> MountOutcome {
        if surface.has_element(TRIGGER_ID) {
            tracing::debug!("Widget already present, skipping mount");
            return MountOutcome::AlreadyMounted;
        }

        surface.inject(&Skeleton::from_config(&self.config));
        for binding in Binding::ALL {
            surface.bind(binding);
        }

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (notify_tx, _) = broadcast::channel::<Notification>(NOTIFICATION_CAPACITY);
        let cancel = CancellationToken::new();

        let runtime = WidgetRuntime::new(
            WidgetContext::from(&self.config),
            ConversationView::new(surface, self.config.timestamp_format.clone()),
            self.transport.clone(),
            event_rx,
            &event_tx,
            notify_tx.clone(),
            cancel.clone(),
        );
        let task = tokio::spawn(runtime.run());

        tracing::info!(method = %self.config.method, "Widget mounted");

        MountOutcome::Mounted(Widget {
            handle: WidgetHandle::new(event_tx, notify_tx, cancel),
            task,
        })
    }
}
