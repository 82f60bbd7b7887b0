//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::transition::*;
use super::*;
use crate::classifier::RawResponse;
use crate::view::Sender;
use proptest::prelude::*;
use std::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context(allow_concurrent_sends: bool) -> WidgetContext {
    WidgetContext {
        allow_concurrent_sends,
        ..WidgetContext::new("nexchat.api.send_message_to_n8n")
    }
}

fn is_bot_message(effect: &Effect) -> bool {
    matches!(
        effect,
        Effect::AppendMessage {
            sender: Sender::Bot,
            ..
        }
    )
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_response() -> impl Strategy<Value = RawResponse> {
    prop_oneof![
        "[a-zA-Z <>&]{0,30}".prop_map(RawResponse::reply),
        "[a-zA-Z ]{0,30}".prop_map(RawResponse::error),
        Just(RawResponse::exception(
            r#"["N8N_WEBHOOK_URL not configured: missing"]"#
        )),
        "[a-zA-Z\\[\\]\" ]{0,30}".prop_map(RawResponse::exception),
        Just(RawResponse::default()),
    ]
}

/// Request ids mostly hit the first few ids a widget issues
fn arb_request_id() -> impl Strategy<Value = RequestId> {
    0u64..4
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::TriggerClicked),
        Just(Event::CloseClicked),
        "[a-z ]{0,10}".prop_map(|value| Event::InputChanged { value }),
        Just(Event::Submit),
        (any::<bool>(), any::<bool>()).prop_map(|(enter, shift)| Event::KeyPressed {
            key: if enter { Key::Enter } else { Key::Other },
            shift,
        }),
        (arb_request_id(), arb_response()).prop_map(|(request_id, response)| {
            Event::RemoteCompleted {
                request_id,
                response,
            }
        }),
        (arb_request_id(), "[a-z ]{1,20}")
            .prop_map(|(request_id, detail)| Event::RemoteFailed { request_id, detail }),
        (arb_request_id(), 1u64..120).prop_map(|(request_id, secs)| Event::RemoteTimedOut {
            request_id,
            after: Duration::from_secs(secs),
        }),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // A user entry is always rendered before the call that carries it
    #[test]
    fn prop_user_message_precedes_call(
        events in proptest::collection::vec(arb_event(), 0..30),
        concurrent in any::<bool>()
    ) {
        let ctx = test_context(concurrent);
        let mut state = WidgetState::default();

        for event in events {
            if let Ok(result) = transition(&state, &ctx, event) {
                if let Some(call_at) = result
                    .effects
                    .iter()
                    .position(|e| matches!(e, Effect::CallRemote { .. }))
                {
                    let user_at = result.effects.iter().position(|e| {
                        matches!(e, Effect::AppendMessage { sender: Sender::User, .. })
                    });
                    prop_assert!(matches!(user_at, Some(i) if i < call_at));
                }
                state = result.new_state;
            }
        }
    }

    // Whitespace-only input never produces anything
    #[test]
    fn prop_whitespace_submit_is_silent(
        input in "[ \t\n]{0,10}",
        via_enter in any::<bool>(),
        concurrent in any::<bool>()
    ) {
        let state = WidgetState {
            input,
            ..WidgetState::default()
        };
        let event = if via_enter {
            Event::KeyPressed { key: Key::Enter, shift: false }
        } else {
            Event::Submit
        };

        let result = transition(&state, &test_context(concurrent), event).unwrap();
        prop_assert!(result.effects.is_empty());
        prop_assert_eq!(result.new_state, state);
    }

    // Toggle alternates and focus moves only on open
    #[test]
    fn prop_toggle_alternates(clicks in 1usize..20) {
        let ctx = test_context(false);
        let mut state = WidgetState::default();

        for i in 0..clicks {
            let result = transition(&state, &ctx, Event::TriggerClicked).unwrap();
            let opened = i % 2 == 0;
            prop_assert_eq!(result.new_state.window.is_open(), opened);
            prop_assert_eq!(
                result.effects.contains(&Effect::FocusInput),
                opened
            );
            prop_assert_eq!(
                &result.effects[0],
                &Effect::SetWindowOpen { open: opened }
            );
            state = result.new_state;
        }
    }

    // Without concurrent sends there is never more than one call in flight
    #[test]
    fn prop_single_request_in_flight(events in proptest::collection::vec(arb_event(), 0..40)) {
        let ctx = test_context(false);
        let mut state = WidgetState::default();

        for event in events {
            if let Ok(result) = transition(&state, &ctx, event) {
                state = result.new_state;
                prop_assert!(state.in_flight.len() <= 1, "in flight: {:?}", state.in_flight);
            }
        }
    }

    // Every resolved request renders exactly one bot entry
    #[test]
    fn prop_completion_renders_one_bot_message(
        response in arb_response(),
        outcome_kind in 0u8..3
    ) {
        let ctx = test_context(false);
        let state = WidgetState {
            input: "hello".to_string(),
            ..WidgetState::default()
        };
        let pending = transition(&state, &ctx, Event::Submit).unwrap().new_state;

        let event = match outcome_kind {
            0 => Event::RemoteCompleted { request_id: 0, response },
            1 => Event::RemoteFailed { request_id: 0, detail: "reset".to_string() },
            _ => Event::RemoteTimedOut { request_id: 0, after: Duration::from_secs(5) },
        };
        let result = transition(&pending, &ctx, event).unwrap();

        prop_assert_eq!(result.effects.iter().filter(|e| is_bot_message(e)).count(), 1);
        prop_assert_eq!(&result.effects[0], &Effect::HidePending);
        prop_assert!(!result.new_state.is_pending());
    }

    // The banner always repeats the text of the error entry
    #[test]
    fn prop_banner_matches_error_entry(events in proptest::collection::vec(arb_event(), 0..30)) {
        let ctx = test_context(true);
        let mut state = WidgetState::default();

        for event in events {
            if let Ok(result) = transition(&state, &ctx, event) {
                for (i, effect) in result.effects.iter().enumerate() {
                    if let Effect::ShowErrorBanner { message } = effect {
                        let entry = i.checked_sub(1).and_then(|j| result.effects.get(j));
                        prop_assert_eq!(
                            entry,
                            Some(&Effect::bot_error(message.clone()))
                        );
                    }
                }
                state = result.new_state;
            }
        }
    }

    // Completions for ids never issued are refused without touching state
    #[test]
    fn prop_unknown_completion_refused(request_id in 0u64..100, response in arb_response()) {
        let result = transition(
            &WidgetState::default(),
            &test_context(false),
            Event::RemoteCompleted { request_id, response },
        );
        prop_assert_eq!(result.unwrap_err(), TransitionError::UnknownRequest(request_id));
    }
}
