//! Custom Test Assertions
//!
//! Assertion helpers for response envelopes and record representations that
//! give more meaningful messages than a bare `assert_eq!` on JSON.

use serde_json::Value;

/// Asserts a `{ success: true, <id_field>: <id> }` envelope and returns the id
///
/// # Panics
///
/// Panics if `success` is not `true` or the id field is not a positive number
pub fn assert_success_envelope(body: &Value, id_field: &str) -> u64 {
    assert_eq!(
        body.get("success"),
        Some(&Value::Bool(true)),
        "Expected success envelope, got {body}"
    );
    let id = body
        .get(id_field)
        .and_then(Value::as_u64)
        .unwrap_or_else(|| panic!("Expected numeric `{id_field}` in {body}"));
    assert!(id > 0, "Expected positive `{id_field}`, got {id}");
    id
}

/// Asserts a `{ success: false, error, message }` envelope with the given kind
///
/// # Panics
///
/// Panics if `success` is not `false`, the kind differs, or the message is empty
pub fn assert_failure_envelope(body: &Value, expected_kind: &str) {
    assert_eq!(
        body.get("success"),
        Some(&Value::Bool(false)),
        "Expected failure envelope, got {body}"
    );
    assert_eq!(
        body.get("error").and_then(Value::as_str),
        Some(expected_kind),
        "Unexpected error kind in {body}"
    );
    let message = body.get("message").and_then(Value::as_str).unwrap_or_default();
    assert!(!message.is_empty(), "Expected a non-empty message in {body}");
}

/// Asserts the item ids on a record representation, in line order
pub fn assert_item_lines(record: &Value, expected: &[u64]) {
    let actual: Vec<u64> = record["sublists"]["item"]
        .as_array()
        .map(|lines| lines.iter().filter_map(|line| line["item"].as_u64()).collect())
        .unwrap_or_default();
    assert_eq!(actual, expected, "Item lines differ in {record}");
}

/// Asserts the customer on a record representation
pub fn assert_entity(record: &Value, expected: u64) {
    assert_eq!(
        record["fields"]["entity"].as_u64(),
        Some(expected),
        "Unexpected entity in {record}"
    );
}
