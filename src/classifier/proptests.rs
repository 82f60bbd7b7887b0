//! Property-based tests for response classification

use super::*;
use proptest::prelude::*;
use serde_json::{json, Value};

fn arb_json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        ".{0,20}".prop_map(Value::String),
    ]
}

fn arb_json() -> impl Strategy<Value = Value> {
    arb_json_leaf().prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            proptest::collection::hash_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn arb_raw_response() -> impl Strategy<Value = RawResponse> {
    (
        proptest::option::of(arb_json()),
        proptest::option::of(arb_json()),
    )
        .prop_map(|(message, exc)| RawResponse {
            message,
            exc,
            exc_type: None,
        })
}

proptest! {
    /// Any payload classifies to exactly one outcome, identically on every call
    #[test]
    fn prop_classification_total_and_deterministic(response in arb_raw_response()) {
        let first = classify(&response);
        let second = classify(&response);
        prop_assert_eq!(&first, &second);
        let is_success = matches!(first, ResponseOutcome::Success { .. });
        prop_assert!(!first.user_message().is_empty() || is_success);
    }

    /// A non-empty string reply always wins, whatever else is in the payload
    #[test]
    fn prop_reply_has_precedence(reply in ".{1,40}", other in arb_json(), exc in proptest::option::of(arb_json())) {
        let response = RawResponse {
            message: Some(json!({ "reply": reply.clone(), "error": other })),
            exc,
            exc_type: None,
        };
        prop_assert_eq!(classify(&response), ResponseOutcome::Success { reply });
    }

    /// Exception text that is not valid JSON never produces a configuration error
    #[test]
    fn prop_unparseable_exception_is_unexpected(raw in "[^\\[\\]\"]{1,60}") {
        prop_assume!(parse_exception_payload(&raw).is_err());
        let outcome = classify(&RawResponse::exception(raw.clone()));
        prop_assert_eq!(outcome, ResponseOutcome::UnexpectedException { raw_detail: raw });
    }

    /// The marker in the first traceback entry always maps to a configuration error
    #[test]
    fn prop_marker_in_first_entry(prefix in "[a-zA-Z ]{0,10}", suffix in "[a-zA-Z :]{0,20}", rest in proptest::collection::vec("[a-z ]{0,10}", 0..3)) {
        let mut entries = vec![format!("{prefix}{CONFIG_ERROR_MARKER}{suffix}")];
        entries.extend(rest);
        let raw = serde_json::to_string(&entries).unwrap();
        prop_assert_eq!(classify(&RawResponse::exception(raw)), ResponseOutcome::ConfigurationError);
    }

    /// Later entries of any JSON type do not hide the marker in the first one
    #[test]
    fn prop_marker_survives_mixed_entries(rest in proptest::collection::vec(arb_json(), 0..4)) {
        let mut entries = vec![json!(format!("{CONFIG_ERROR_MARKER}: missing"))];
        entries.extend(rest);
        let raw = Value::Array(entries).to_string();
        prop_assert_eq!(classify(&RawResponse::exception(raw)), ResponseOutcome::ConfigurationError);
    }

    /// Any other traceback array is an unexpected exception that keeps its raw text
    #[test]
    fn prop_other_traceback_unexpected(entries in proptest::collection::vec("[a-z ]{1,20}", 1..4)) {
        let raw = serde_json::to_string(&entries).unwrap();
        let outcome = classify(&RawResponse::exception(raw.clone()));
        prop_assert_eq!(outcome.diagnostic(), Some(("Nexchat Error", raw.as_str())));
    }
}
