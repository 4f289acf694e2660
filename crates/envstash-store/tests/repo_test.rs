// Integration tests for the environment, variable and reference repositories

use chrono::{TimeZone, Utc};
use envstash_core::model::{
    EnvCreateArgs, EnvUpdateArgs, Patch, RefCreateArgs, RefUpdateArgs, VarCreateArgs,
    VarUpdateArgs,
};
use envstash_core::ExErrorKind;
use envstash_store::{db, EnvRepo, RefRepo, VarRepo};
use rusqlite::Connection;

fn setup() -> Connection {
    db::open_in_memory().expect("Failed to open in-memory database")
}

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn seed_env(conn: &Connection, name: &str) {
    EnvRepo::create(conn, &EnvCreateArgs::new(name, t0())).unwrap();
}

fn seed_var(conn: &Connection, env: &str, name: &str, value: &str) {
    VarRepo::create(conn, &VarCreateArgs::new(env, name, value, t0())).unwrap();
}

// ========== Environments ==========

#[test]
fn test_env_create_and_show_round_trip() {
    let conn = setup();
    let mut args = EnvCreateArgs::new("/home/me/project", t0());
    args.comment = "work".to_string();
    EnvRepo::create(&conn, &args).unwrap();

    let env = EnvRepo::show(&conn, "/home/me/project").unwrap();
    assert_eq!(env.name, "/home/me/project");
    assert_eq!(env.comment, "work");
    assert_eq!(env.create_time, t0());
    assert!(env.enabled);
}

#[test]
fn test_env_create_duplicate_fails() {
    let conn = setup();
    seed_env(&conn, "dev");
    let err = EnvRepo::create(&conn, &EnvCreateArgs::new("dev", t0())).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::AlreadyExists);
    assert_eq!(err.entity_id(), Some("dev"));
}

#[test]
fn test_env_list_sorted_by_name() {
    let conn = setup();
    seed_env(&conn, "b");
    seed_env(&conn, "a");
    let names: Vec<_> = EnvRepo::list(&conn).unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn test_env_delete_returns_affected_rows() {
    let conn = setup();
    seed_env(&conn, "dev");
    assert_eq!(EnvRepo::delete(&conn, "dev").unwrap(), 1);
    assert_eq!(EnvRepo::delete(&conn, "dev").unwrap(), 0);
}

#[test]
fn test_env_delete_cascades_to_variables_and_references() {
    let conn = setup();
    seed_env(&conn, "dev");
    seed_var(&conn, "dev", "PORT", "8080");
    RefRepo::create(&conn, &RefCreateArgs::new("dev", "ALIAS", "dev", "PORT", t0())).unwrap();

    assert_eq!(EnvRepo::delete(&conn, "dev").unwrap(), 1);

    let vars: i64 = conn
        .query_row("SELECT COUNT(*) FROM variable", [], |row| row.get(0))
        .unwrap();
    let refs: i64 = conn
        .query_row("SELECT COUNT(*) FROM reference", [], |row| row.get(0))
        .unwrap();
    assert_eq!((vars, refs), (0, 0));
}

#[test]
fn test_env_delete_blocked_by_reference_from_other_env() {
    let conn = setup();
    seed_env(&conn, "shared");
    seed_env(&conn, "app");
    seed_var(&conn, "shared", "TOKEN", "secret");
    RefRepo::create(&conn, &RefCreateArgs::new("app", "TOKEN", "shared", "TOKEN", t0())).unwrap();

    let err = EnvRepo::delete(&conn, "shared").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::ReferencedByOther);
    assert_eq!(err.entity_id(), Some("shared"));
    assert!(err.message().contains("app/TOKEN"));
    assert!(!err.to_string().contains("FOREIGN KEY"));
    assert_eq!(EnvRepo::list(&conn).unwrap().len(), 2);
}

#[test]
fn test_env_delete_ignores_own_references_when_listing_blockers() {
    let conn = setup();
    seed_env(&conn, "shared");
    seed_env(&conn, "app");
    seed_var(&conn, "shared", "TOKEN", "secret");
    RefRepo::create(&conn, &RefCreateArgs::new("shared", "SELF", "shared", "TOKEN", t0())).unwrap();
    RefRepo::create(&conn, &RefCreateArgs::new("app", "TOKEN", "shared", "TOKEN", t0())).unwrap();

    let err = EnvRepo::delete(&conn, "shared").unwrap_err();
    assert!(err.message().contains("app/TOKEN"));
    assert!(!err.message().contains("shared/SELF"));

    RefRepo::delete(&conn, "app", "TOKEN").unwrap();
    assert_eq!(EnvRepo::delete(&conn, "shared").unwrap(), 1);
}

#[test]
fn test_env_update_keeps_unset_fields_and_renames() {
    let conn = setup();
    let mut args = EnvCreateArgs::new("old", t0());
    args.comment = "keep me".to_string();
    EnvRepo::create(&conn, &args).unwrap();

    let later = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let new_name = EnvRepo::update(
        &conn,
        "old",
        EnvUpdateArgs {
            name: Patch::Set("new".to_string()),
            update_time: Patch::Set(later),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(new_name, "new");

    let env = EnvRepo::show(&conn, "new").unwrap();
    assert_eq!(env.comment, "keep me");
    assert_eq!(env.create_time, t0());
    assert_eq!(env.update_time, later);
    assert_eq!(
        EnvRepo::show(&conn, "old").unwrap_err().kind(),
        ExErrorKind::EnvironmentNotFound
    );
}

#[test]
fn test_env_update_clear_resets_comment() {
    let conn = setup();
    let mut args = EnvCreateArgs::new("dev", t0());
    args.comment = "something".to_string();
    EnvRepo::create(&conn, &args).unwrap();

    EnvRepo::update(
        &conn,
        "dev",
        EnvUpdateArgs {
            comment: Patch::Clear,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(EnvRepo::show(&conn, "dev").unwrap().comment, "");
}

#[test]
fn test_env_update_clear_name_is_invalid() {
    let conn = setup();
    seed_env(&conn, "dev");
    let err = EnvRepo::update(
        &conn,
        "dev",
        EnvUpdateArgs {
            name: Patch::Clear,
            ..Default::default()
        },
    )
    .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
}

#[test]
fn test_env_update_missing_is_not_found() {
    let conn = setup();
    let err = EnvRepo::update(&conn, "ghost", EnvUpdateArgs::default()).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::EnvironmentNotFound);
}

// ========== Variables ==========

#[test]
fn test_var_duplicate_in_same_env_fails() {
    let conn = setup();
    seed_env(&conn, "E1");
    seed_env(&conn, "E2");
    seed_var(&conn, "E1", "N", "1");

    let err = VarRepo::create(&conn, &VarCreateArgs::new("E1", "N", "2", t0())).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::AlreadyExists);

    // Same name in another environment is fine
    VarRepo::create(&conn, &VarCreateArgs::new("E2", "N", "3", t0())).unwrap();
}

#[test]
fn test_var_create_in_missing_env_fails() {
    let conn = setup();
    let err = VarRepo::create(&conn, &VarCreateArgs::new("ghost", "N", "1", t0())).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::EnvironmentNotFound);
}

#[test]
fn test_var_list_sorted_and_completions_round_trip() {
    let conn = setup();
    seed_env(&conn, "dev");
    let mut args = VarCreateArgs::new("dev", "LOG_LEVEL", "info", t0());
    args.completions = vec!["debug".to_string(), "info".to_string()];
    VarRepo::create(&conn, &args).unwrap();
    seed_var(&conn, "dev", "API_URL", "http://localhost");

    let vars = VarRepo::list(&conn, "dev").unwrap();
    let names: Vec<_> = vars.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["API_URL", "LOG_LEVEL"]);
    assert_eq!(vars[1].completions, vec!["debug", "info"]);
    assert_eq!(vars[1].value.as_str(), "info");
}

#[test]
fn test_var_delete_blocked_while_referenced() {
    let conn = setup();
    seed_env(&conn, "E1");
    seed_env(&conn, "E2");
    seed_var(&conn, "E1", "v1", "hello");
    RefRepo::create(&conn, &RefCreateArgs::new("E2", "r1", "E1", "v1", t0())).unwrap();

    let err = VarRepo::delete(&conn, "E1", "v1").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::ReferencedByOther);
    assert!(err.message().contains("E2/r1"));

    assert_eq!(RefRepo::delete(&conn, "E2", "r1").unwrap(), 1);
    assert_eq!(VarRepo::delete(&conn, "E1", "v1").unwrap(), 1);
}

#[test]
fn test_var_delete_missing_returns_zero() {
    let conn = setup();
    seed_env(&conn, "dev");
    assert_eq!(VarRepo::delete(&conn, "dev", "nope").unwrap(), 0);
}

#[test]
fn test_var_update_moves_and_renames() {
    let conn = setup();
    seed_env(&conn, "a");
    seed_env(&conn, "b");
    seed_var(&conn, "a", "X", "1");

    let key = VarRepo::update(
        &conn,
        "a",
        "X",
        VarUpdateArgs {
            env_name: Patch::Set("b".to_string()),
            name: Patch::Set("Y".to_string()),
            value: Patch::Set("2".into()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(key, ("b".to_string(), "Y".to_string()));

    let var = VarRepo::show(&conn, "b", "Y").unwrap();
    assert_eq!(var.value.as_str(), "2");
    assert_eq!(
        VarRepo::show(&conn, "a", "X").unwrap_err().kind(),
        ExErrorKind::VariableNotFound
    );
}

#[test]
fn test_var_update_clear_completions_and_disable() {
    let conn = setup();
    seed_env(&conn, "dev");
    let mut args = VarCreateArgs::new("dev", "MODE", "fast", t0());
    args.completions = vec!["fast".to_string()];
    VarRepo::create(&conn, &args).unwrap();

    VarRepo::update(
        &conn,
        "dev",
        "MODE",
        VarUpdateArgs {
            completions: Patch::Clear,
            enabled: Patch::Set(false),
            ..Default::default()
        },
    )
    .unwrap();

    let var = VarRepo::show(&conn, "dev", "MODE").unwrap();
    assert!(var.completions.is_empty());
    assert!(!var.enabled);
    assert_eq!(var.value.as_str(), "fast");
}

// ========== References ==========

#[test]
fn test_ref_create_requires_existing_target() {
    let conn = setup();
    seed_env(&conn, "dev");
    let err = RefRepo::create(&conn, &RefCreateArgs::new("dev", "R", "dev", "missing", t0()))
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::VariableNotFound);
}

#[test]
fn test_ref_target_follows_variable_rename() {
    let conn = setup();
    seed_env(&conn, "dev");
    seed_var(&conn, "dev", "OLD", "v");
    RefRepo::create(&conn, &RefCreateArgs::new("dev", "R", "dev", "OLD", t0())).unwrap();

    VarRepo::update(
        &conn,
        "dev",
        "OLD",
        VarUpdateArgs {
            name: Patch::Set("NEW".to_string()),
            ..Default::default()
        },
    )
    .unwrap();

    let (reference, _) = RefRepo::show(&conn, "dev", "R").unwrap();
    assert_eq!(reference.ref_var_name, "NEW");
}

#[test]
fn test_ref_update_requires_both_target_halves() {
    let conn = setup();
    seed_env(&conn, "dev");
    seed_var(&conn, "dev", "A", "1");
    RefRepo::create(&conn, &RefCreateArgs::new("dev", "R", "dev", "A", t0())).unwrap();

    let err = RefRepo::update(
        &conn,
        "dev",
        "R",
        RefUpdateArgs {
            ref_var_name: Patch::Set("B".to_string()),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    assert!(err.message().contains("provided together"));
}

#[test]
fn test_ref_update_retargets() {
    let conn = setup();
    seed_env(&conn, "dev");
    seed_env(&conn, "prod");
    seed_var(&conn, "dev", "A", "1");
    seed_var(&conn, "prod", "B", "2");
    RefRepo::create(&conn, &RefCreateArgs::new("dev", "R", "dev", "A", t0())).unwrap();

    RefRepo::update(
        &conn,
        "dev",
        "R",
        RefUpdateArgs {
            ref_env_name: Patch::Set("prod".to_string()),
            ref_var_name: Patch::Set("B".to_string()),
            ..Default::default()
        },
    )
    .unwrap();

    let (reference, _) = RefRepo::show(&conn, "dev", "R").unwrap();
    assert_eq!(
        (reference.ref_env_name.as_str(), reference.ref_var_name.as_str()),
        ("prod", "B")
    );
}

#[test]
fn test_ref_list_by_target_spans_environments() {
    let conn = setup();
    seed_env(&conn, "shared");
    seed_env(&conn, "a");
    seed_env(&conn, "b");
    seed_var(&conn, "shared", "TOKEN", "t");
    RefRepo::create(&conn, &RefCreateArgs::new("b", "TOKEN", "shared", "TOKEN", t0())).unwrap();
    RefRepo::create(&conn, &RefCreateArgs::new("a", "GH", "shared", "TOKEN", t0())).unwrap();

    let var_id = VarRepo::find_id(&conn, "shared", "TOKEN").unwrap();
    let refs = RefRepo::list_by_target(&conn, var_id).unwrap();
    let keys: Vec<_> = refs
        .iter()
        .map(|r| format!("{}/{}", r.env_name, r.name))
        .collect();
    assert_eq!(keys, vec!["a/GH", "b/TOKEN"]);
}
