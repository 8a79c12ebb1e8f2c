#![allow(clippy::unwrap_used, clippy::expect_used)]

use serde_json::json;
use sheetwatch_core::errors::{SwError, SwErrorKind};
use sheetwatch_core::logging_facility::test_capture::init_test_capture;
use sheetwatch_core::oplog::{LogLevel, OperationKind, OperationLog};
use sheetwatch_core::{log_op_end, log_op_error, log_op_start};
use sheetwatch_core::schema::{EVENT_END, EVENT_END_ERROR, EVENT_RECORD, EVENT_START};

const RAW_TOKEN: &str = "abcDEF123456token";
const RAW_URL: &str = "https://discord.com/api/webhooks/123456789012/abcDEF123456token";

// ----------------------------------------------------------------------------
// Canonical macros
// ----------------------------------------------------------------------------

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    log_op_start!("test_log_op_start_unique_1");
    capture.assert_event_exists("test_log_op_start_unique_1", EVENT_START);
}

#[test]
fn test_log_op_end_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let end_events: Vec<_> = capture
        .events_for_op(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END))
        .collect();
    assert_eq!(end_events.len(), 1);
    assert_eq!(end_events[0].fields.get("duration_ms"), Some(&"42".to_string()));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = SwError::new(SwErrorKind::WebhookNotFound);
    log_op_error!(op_name, err, duration_ms = 10);

    let error_events: Vec<_> = capture
        .events_for_op(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .collect();
    assert_eq!(error_events.len(), 1);
    assert_eq!(
        error_events[0].fields.get("err.code"),
        Some(&"WEBHOOK_NOT_FOUND".to_string())
    );
}

#[test]
fn test_log_op_error_carries_message_and_caller_fields() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_4";

    let err = SwError::new(SwErrorKind::WebhookNotFound).with_message("webhook deleted");
    log_op_error!(op_name, err, duration_ms = 7_u64, endpoint = "party", attempt = 2_u64,);

    let events: Vec<_> = capture
        .events_for_op(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .collect();
    assert_eq!(events.len(), 1);
    let fields = &events[0].fields;
    assert_eq!(fields.get("err.message"), Some(&"webhook deleted".to_string()));
    assert_eq!(fields.get("endpoint"), Some(&"party".to_string()));
    assert_eq!(fields.get("attempt"), Some(&"2".to_string()));
    assert_eq!(fields.get("duration_ms"), Some(&"7".to_string()));
}

// ----------------------------------------------------------------------------
// Operation log masking
// ----------------------------------------------------------------------------

#[test]
fn test_webhook_url_detail_never_emits_raw_token() {
    let capture = init_test_capture();
    let log = OperationLog::new();

    log.record(
        OperationKind::WebhookDelivery,
        LogLevel::Info,
        "masking-marker-4",
        Some(&json!({ "webhook_url": RAW_URL })),
        None,
    );

    let events: Vec<_> = capture
        .events()
        .into_iter()
        .filter(|e| e.fields.get("message").map(String::as_str) == Some("masking-marker-4"))
        .collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_RECORD));
    let details = events[0].fields.get("details").unwrap();
    assert!(details.contains("1234...9012/abcD...oken"), "{}", details);
    assert!(!capture.any_event_contains(RAW_TOKEN));
}

#[test]
fn test_webhook_url_in_message_is_masked() {
    let capture = init_test_capture();
    let log = OperationLog::new();

    log.record(
        OperationKind::WebhookDelivery,
        LogLevel::Error,
        &format!("masking-marker-5 POST {} failed", RAW_URL),
        None,
        Some(SwErrorKind::ServerError),
    );

    let found = capture.count_events(|e| {
        e.fields
            .get("message")
            .is_some_and(|m| m.starts_with("masking-marker-5"))
    });
    assert_eq!(found, 1);
    assert!(!capture.any_event_contains(RAW_TOKEN));
}

#[test]
fn test_timed_emits_start_and_end() {
    let capture = init_test_capture();
    let log = OperationLog::new();
    let _: Vec<u8> = log.timed(OperationKind::MonitorCycle, Vec::new);
    capture.assert_event_exists("monitor_cycle", EVENT_START);
    capture.assert_event_exists("monitor_cycle", EVENT_END);
}
