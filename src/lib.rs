//! NexChat widget core
//!
//! A floating chat widget: a trigger that toggles a conversation window,
//! message dispatch to a backend method, and classification of whatever the
//! backend answers into something a user can read.

pub mod classifier;
pub mod config;
pub mod escape;
pub mod runtime;
pub mod state_machine;
pub mod surface;
pub mod transport;
pub mod view;
pub mod widget;

pub use classifier::{classify, RawResponse, ResponseOutcome};
pub use config::{ConfigError, FrappeConfig, WidgetConfig};
pub use runtime::{Notification, RuntimeError, WidgetHandle};
pub use surface::{Document, Surface};
pub use transport::{FrappeTransport, LoggingTransport, OutgoingRequest, RemoteCall, TransportError};
pub use view::{ConversationView, Message, Sender};
pub use widget::{MountOutcome, Widget, WidgetInitializer};
