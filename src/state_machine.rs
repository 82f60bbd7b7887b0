//! Widget state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! UI clicks and remote call completions come in as [`Event`]s, and
//! [`transition`] answers with a new [`WidgetState`] plus the [`Effect`]s the
//! runtime must carry out.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::{Event, Key};
pub use state::{RequestId, WidgetContext, WidgetState, WindowState};
pub use transition::{transition, TransitionError, TransitionResult};
