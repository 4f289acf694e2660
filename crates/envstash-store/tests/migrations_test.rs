// Integration tests for the migration framework

use envstash_core::ExErrorKind;
use rusqlite::Connection;

fn setup_test_db() -> Connection {
    Connection::open_in_memory().expect("Failed to create in-memory database")
}

fn get_table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn test_apply_migrations_on_empty_db() {
    // Given: An empty SQLite database
    let mut conn = setup_test_db();

    // When: Migrations are applied
    let result = envstash_store::migrations::apply_migrations(&mut conn);

    // Then: The schema exists
    assert!(result.is_ok(), "Migrations should succeed: {:?}", result.err());
    let tables = get_table_names(&conn);
    for expected in ["environment", "reference", "schema_version", "variable"] {
        assert!(tables.contains(&expected.to_string()), "Missing table: {}", expected);
    }
}

#[test]
fn test_migrations_are_recorded_with_checksum() {
    let mut conn = setup_test_db();
    envstash_store::migrations::apply_migrations(&mut conn).unwrap();

    let checksum: String = conn
        .query_row(
            "SELECT checksum FROM schema_version WHERE migration_id = '001_initial_schema'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(checksum.len(), 64);
}

#[test]
fn test_reapplying_is_a_no_op() {
    let mut conn = setup_test_db();
    envstash_store::migrations::apply_migrations(&mut conn).unwrap();
    envstash_store::migrations::apply_migrations(&mut conn).unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, envstash_store::migrations::get_migrations().len() as i64);
}

#[test]
fn test_checksum_mismatch_fails() {
    // Given: A migrated database whose recorded checksum was tampered with
    let mut conn = setup_test_db();
    envstash_store::migrations::apply_migrations(&mut conn).unwrap();
    conn.execute(
        "UPDATE schema_version SET checksum = 'deadbeef' WHERE migration_id = '001_initial_schema'",
        [],
    )
    .unwrap();

    // When: Migrations run again
    let err = envstash_store::migrations::apply_migrations(&mut conn).unwrap_err();

    // Then: The mismatch is reported
    assert_eq!(err.kind(), ExErrorKind::Persistence);
    assert_eq!(err.op(), Some("migration_checksum"));
    assert!(err.message().contains("001_initial_schema"));
}

#[test]
fn test_on_disk_database_persists_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("envstash.db");

    drop(envstash_store::db::open(&path).unwrap());
    let conn = envstash_store::db::open(&path).unwrap();

    let applied = envstash_store::migrations::applied_migrations(&conn).unwrap();
    assert_eq!(applied, vec!["001_initial_schema"]);
}
