// Integration tests for cross-environment reference resolution

use chrono::Utc;
use envstash_core::model::{EnvCreateArgs, RefCreateArgs, VarCreateArgs, VarUpdateArgs, Patch};
use envstash_core::ExErrorKind;
use envstash_store::{db, list_resolved, resolve_target, EnvRepo, RefRepo, VarRepo};
use rusqlite::Connection;

fn setup() -> Connection {
    let conn = db::open_in_memory().unwrap();
    let now = Utc::now();
    EnvRepo::create(&conn, &EnvCreateArgs::new("E1", now)).unwrap();
    EnvRepo::create(&conn, &EnvCreateArgs::new("E2", now)).unwrap();
    VarRepo::create(&conn, &VarCreateArgs::new("E1", "v1", "hello", now)).unwrap();
    VarRepo::create(&conn, &VarCreateArgs::new("E1", "v2", "world", now)).unwrap();
    RefRepo::create(&conn, &RefCreateArgs::new("E2", "r2", "E1", "v2", now)).unwrap();
    RefRepo::create(&conn, &RefCreateArgs::new("E2", "r1", "E1", "v1", now)).unwrap();
    conn
}

#[test]
fn test_resolve_target() {
    let conn = setup();
    let (reference, variable) = resolve_target(&conn, "E2", "r1").unwrap();
    assert_eq!(reference.name, "r1");
    assert_eq!(variable.env_name, "E1");
    assert_eq!(variable.name, "v1");
    assert_eq!(variable.value.as_str(), "hello");
}

#[test]
fn test_resolve_target_missing_env_and_ref() {
    let conn = setup();
    assert_eq!(
        resolve_target(&conn, "ghost", "r1").unwrap_err().kind(),
        ExErrorKind::EnvironmentNotFound
    );
    assert_eq!(
        resolve_target(&conn, "E2", "ghost").unwrap_err().kind(),
        ExErrorKind::ReferenceNotFound
    );
}

#[test]
fn test_list_resolved_parallel_and_sorted() {
    let conn = setup();
    let (refs, vars) = list_resolved(&conn, "E2").unwrap();
    let ref_names: Vec<_> = refs.iter().map(|r| r.name.as_str()).collect();
    let values: Vec<_> = vars.iter().map(|v| v.value.as_str()).collect();
    assert_eq!(ref_names, vec!["r1", "r2"]);
    assert_eq!(values, vec!["hello", "world"]);
}

#[test]
fn test_resolution_sees_current_value() {
    let conn = setup();
    VarRepo::update(
        &conn,
        "E1",
        "v1",
        VarUpdateArgs {
            value: Patch::Set("changed".into()),
            ..Default::default()
        },
    )
    .unwrap();
    let (_, variable) = resolve_target(&conn, "E2", "r1").unwrap();
    assert_eq!(variable.value.as_str(), "changed");
}
