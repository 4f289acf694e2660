#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{TimeZone, Utc};
use envstash_core::logging_facility::test_capture::init_test_capture;
use envstash_core::model::{EnvCreateArgs, VarCreateArgs};
use envstash_core::{ExErrorKind, Service};
use envstash_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use envstash_core_types::{RequestContext, RequestId};
use envstash_engine::{EnvService, Observer, TracedService};

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn ctx(id: &str) -> RequestContext {
    RequestContext::with_request_id(RequestId::from_string(id.to_string()))
}

#[test]
fn test_traced_call_emits_start_and_end() {
    let capture = init_test_capture();
    let conn = envstash_store::db::open_in_memory().unwrap();
    let svc = TracedService::new(EnvService::new(&conn), Observer::new("tests"));
    let ctx = ctx("req-traced-start-end");

    svc.env_create(&ctx, EnvCreateArgs::new("dev", t0())).unwrap();

    let events = capture.events_for_request("req-traced-start-end");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].op(), Some("env_create"));
    assert_eq!(events[0].event(), Some(EVENT_START));
    assert_eq!(events[0].field("env_name"), Some("dev"));
    assert_eq!(events[1].event(), Some(EVENT_END));
    assert!(events[1].field("duration_ms").is_some());
}

#[test]
fn test_traced_error_emits_end_error_with_kind() {
    let capture = init_test_capture();
    let conn = envstash_store::db::open_in_memory().unwrap();
    let svc = TracedService::new(EnvService::new(&conn), Observer::new("tests"));
    let ctx = ctx("req-traced-error");

    let err = svc.env_show(&ctx, "ghost").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::EnvironmentNotFound);

    let events = capture.events_for_request("req-traced-error");
    let last = events.last().expect("Should have events");
    assert_eq!(last.event(), Some(EVENT_END_ERROR));
    assert_eq!(last.field("err_code"), Some("ERR_ENVIRONMENT_NOT_FOUND"));
}

#[test]
fn test_traced_with_tx_traces_body_calls() {
    let capture = init_test_capture();
    let conn = envstash_store::db::open_in_memory().unwrap();
    let svc = TracedService::new(EnvService::new(&conn), Observer::new("tests"));
    let ctx = ctx("req-traced-tx");

    svc.with_tx(&ctx, &mut |ctx: &RequestContext, tx: &dyn Service| {
        tx.env_create(ctx, EnvCreateArgs::new("dev", t0()))?;
        tx.var_create(ctx, VarCreateArgs::new("dev", "TOKEN", "ghp_secret", t0()))?;
        Ok(())
    })
    .unwrap();

    let events = capture.events_for_request("req-traced-tx");
    let seen: Vec<_> = events
        .iter()
        .map(|e| (e.op().unwrap_or(""), e.event().unwrap_or("")))
        .collect();
    assert_eq!(
        seen,
        vec![
            ("with_tx", EVENT_START),
            ("env_create", EVENT_START),
            ("env_create", EVENT_END),
            ("var_create", EVENT_START),
            ("var_create", EVENT_END),
            ("with_tx", EVENT_END),
        ]
    );
    for e in &events {
        assert!(e.fields.values().all(|v| !v.contains("ghp_secret")));
    }
}

#[test]
fn test_disabled_observer_emits_nothing() {
    let capture = init_test_capture();
    let conn = envstash_store::db::open_in_memory().unwrap();
    let svc = TracedService::new(EnvService::new(&conn), Observer::disabled());
    let ctx = ctx("req-traced-disabled");

    svc.env_create(&ctx, EnvCreateArgs::new("dev", t0())).unwrap();
    assert!(capture.events_for_request("req-traced-disabled").is_empty());
}
