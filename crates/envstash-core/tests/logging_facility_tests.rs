#![allow(clippy::unwrap_used, clippy::expect_used)]

use envstash_core::errors::{EnvStashError, ExError, ExErrorKind};
use envstash_core::logging_facility::test_capture::init_test_capture;
use envstash_core::{log_op_end, log_op_error, log_op_start};
use envstash_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use envstash_core_types::Sensitive;

#[test]
fn test_log_op_start_and_end_pair() {
    let capture = init_test_capture();
    let op_name = "test_log_op_pair_unique_1";

    log_op_start!(op_name, env_name = "dev");
    log_op_end!(op_name, duration_ms = 42);

    let starts = capture.count_events(|e| {
        e.op() == Some(op_name) && e.event() == Some(EVENT_START)
    });
    let ends: Vec<_> = capture
        .events()
        .into_iter()
        .filter(|e| e.op() == Some(op_name) && e.event() == Some(EVENT_END))
        .collect();

    assert_eq!(starts, 1, "Should have exactly one start event");
    assert_eq!(ends.len(), 1, "Should have exactly one end event");
    assert_eq!(ends[0].field("duration_ms"), Some("42"));
}

#[test]
fn test_log_op_start_records_entity_fields() {
    let capture = init_test_capture();
    let op_name = "test_log_op_fields_unique_2";

    log_op_start!(op_name, env_name = "/home/me/project", var_name = "PORT");

    let events = capture.events();
    let start = events
        .iter()
        .find(|e| e.op() == Some(op_name))
        .expect("Should have start event");
    assert_eq!(start.field("env_name"), Some("/home/me/project"));
    assert_eq!(start.field("var_name"), Some("PORT"));
}

#[test]
fn test_log_op_error_includes_kind_and_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = EnvStashError::VariableReferenced {
        env_name: "shared".to_string(),
        name: "TOKEN".to_string(),
        referenced_by: vec!["app/TOKEN".to_string()],
    };
    log_op_error!(op_name, err.clone(), duration_ms = 5);

    capture.assert_event_exists(op_name, EVENT_END_ERROR);
    let events = capture.events();
    let error_event = events
        .iter()
        .find(|e| e.op() == Some(op_name) && e.event() == Some(EVENT_END_ERROR))
        .expect("Should have error event");

    let ex_err: ExError = err.into();
    assert_eq!(ex_err.kind(), ExErrorKind::ReferencedByOther);
    assert_eq!(error_event.field("err_code"), Some("ERR_REFERENCED_BY_OTHER"));
    assert_eq!(error_event.field("err_kind"), Some("ReferencedByOther"));
}

#[test]
fn test_sensitive_value_is_redacted_in_events() {
    let capture = init_test_capture();
    let op_name = "test_sensitive_redaction_unique_4";
    let value = Sensitive::new("hunter2".to_string());

    log_op_start!(op_name, value = ?value);

    let events = capture.events();
    let start = events
        .iter()
        .find(|e| e.op() == Some(op_name))
        .expect("Should have start event");
    assert_eq!(start.field("value"), Some("***REDACTED***"));
    assert!(start.fields.values().all(|v| !v.contains("hunter2")));
}

#[test]
#[should_panic(expected = "Expected event")]
fn test_capture_assert_event_exists_fails() {
    let capture = init_test_capture();
    capture.assert_event_exists("nonexistent_op_truly_unique_999", EVENT_START);
}
