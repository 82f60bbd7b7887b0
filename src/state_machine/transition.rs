//! Pure state transition function

use super::state::RequestId;
use super::{Effect, Event, Key, WidgetContext, WidgetState, WindowState};
use crate::classifier::{classify, ResponseOutcome};
use crate::transport::OutgoingRequest;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: WidgetState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: WidgetState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Events the widget refuses to act on
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A request is already in flight and concurrent sends are disabled")]
    RequestPending,
    #[error("No request in flight with id {0}")]
    UnknownRequest(RequestId),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs; all I/O is
/// described by the returned effects.
pub fn transition(
    state: &WidgetState,
    context: &WidgetContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state.window, event) {
        // ============================================================
        // Window toggle
        // ============================================================

        // Focus moves to the input only when the window opens
        (WindowState::Closed, Event::TriggerClicked) => Ok(TransitionResult::new(WidgetState {
            window: WindowState::Open,
            ..state.clone()
        })
        .with_effect(Effect::SetWindowOpen { open: true })
        .with_effect(Effect::FocusInput)),

        (WindowState::Open, Event::TriggerClicked | Event::CloseClicked) => {
            Ok(TransitionResult::new(WidgetState {
                window: WindowState::Closed,
                ..state.clone()
            })
            .with_effect(Effect::SetWindowOpen { open: false }))
        }

        (WindowState::Closed, Event::CloseClicked) => Ok(TransitionResult::new(state.clone())),

        // ============================================================
        // Message dispatch
        // ============================================================
        (_, Event::InputChanged { value }) => Ok(TransitionResult::new(WidgetState {
            input: value,
            ..state.clone()
        })),

        (_, Event::Submit) => submit(state, context),

        (_, Event::KeyPressed { key, shift }) => {
            if is_submit_key(key, shift) {
                submit(state, context)
            } else {
                Ok(TransitionResult::new(state.clone()))
            }
        }

        // ============================================================
        // Remote call completion
        // ============================================================
        (
            _,
            Event::RemoteCompleted {
                request_id,
                response,
            },
        ) => resolve(state, request_id, &classify(&response)),

        (_, Event::RemoteFailed { request_id, detail }) => {
            resolve(state, request_id, &ResponseOutcome::network_failure(detail))
        }

        (_, Event::RemoteTimedOut { request_id, after }) => resolve(
            state,
            request_id,
            &ResponseOutcome::network_failure(format!(
                "request timed out after {}s",
                after.as_secs()
            )),
        ),
    }
}

/// Enter without Shift sends; Shift+Enter and other keys do nothing
pub fn is_submit_key(key: Key, shift: bool) -> bool {
    key == Key::Enter && !shift
}

fn submit(
    state: &WidgetState,
    context: &WidgetContext,
) -> Result<TransitionResult, TransitionError> {
    // Empty or whitespace-only input is silently ignored
    let Some(request) = OutgoingRequest::from_input(&state.input) else {
        return Ok(TransitionResult::new(state.clone()));
    };

    if state.is_pending() && !context.allow_concurrent_sends {
        return Err(TransitionError::RequestPending);
    }

    let request_id = state.next_request_id;
    let mut next = state.clone();
    next.input.clear();
    next.in_flight.insert(request_id);
    next.next_request_id = request_id.wrapping_add(1);

    Ok(TransitionResult::new(next)
        .with_effect(Effect::user_message(request.message_text.clone()))
        .with_effect(Effect::ClearInput)
        .with_effect(Effect::ShowPending)
        .with_effect(Effect::HideErrorBanner)
        .with_effect(Effect::CallRemote {
            request_id,
            request,
        }))
}

fn resolve(
    state: &WidgetState,
    request_id: RequestId,
    outcome: &ResponseOutcome,
) -> Result<TransitionResult, TransitionError> {
    // Late completions (after a timeout) land here too
    if !state.in_flight.contains(&request_id) {
        return Err(TransitionError::UnknownRequest(request_id));
    }

    let mut next = state.clone();
    next.in_flight.remove(&request_id);

    let hide_pending = (!next.is_pending()).then_some(Effect::HidePending);

    Ok(TransitionResult::new(next)
        .with_effects(hide_pending)
        .with_effects(render_outcome(outcome)))
}

/// Effects that present one classified outcome
fn render_outcome(outcome: &ResponseOutcome) -> Vec<Effect> {
    let text = outcome.user_message().to_string();

    if !outcome.is_error() {
        return vec![Effect::bot_message(text)];
    }

    let mut effects = vec![
        Effect::bot_error(text.clone()),
        Effect::ShowErrorBanner { message: text },
    ];
    if let Some((summary, detail)) = outcome.diagnostic() {
        effects.push(Effect::LogDiagnostic {
            summary,
            detail: detail.to_string(),
        });
    }
    effects
}
