use std::collections::HashMap;

use rusqlite::{params, Connection};

use super::checksums::checksum;
use super::embedded::{get_migrations, Migration};
use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, Result};

const SCHEMA_VERSION_DDL: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY,
    migration_id TEXT NOT NULL UNIQUE,
    applied_at TEXT NOT NULL,
    checksum TEXT NOT NULL
)";

/// Bring the schema up to date
///
/// Returns how many migrations were applied by this call; zero when the
/// database was already current. A migration recorded with a checksum that
/// no longer matches its embedded SQL aborts with a `Persistence` error
/// before anything later is applied.
pub fn apply_migrations(conn: &mut Connection) -> Result<usize> {
    conn.execute_batch(SCHEMA_VERSION_DDL)
        .map_err(from_rusqlite)?;
    let recorded = recorded_checksums(conn)?;

    let mut applied = 0;
    for migration in get_migrations() {
        let expected = checksum(migration.sql);
        match recorded.get(migration.id) {
            Some(stored) if *stored == expected => {}
            Some(stored) => return Err(checksum_mismatch(migration.id, stored, &expected)),
            None => {
                apply_one(conn, migration, &expected)?;
                applied += 1;
            }
        }
    }

    if applied > 0 {
        tracing::info!(applied, "schema migrated");
    }
    Ok(applied)
}

/// Ids of applied migrations, in application order
pub fn applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT migration_id FROM schema_version ORDER BY id")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], |row| row.get(0))
        .map_err(from_rusqlite)?;
    rows.collect::<rusqlite::Result<Vec<String>>>()
        .map_err(from_rusqlite)
}

fn recorded_checksums(conn: &Connection) -> Result<HashMap<String, String>> {
    let mut stmt = conn
        .prepare("SELECT migration_id, checksum FROM schema_version")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(from_rusqlite)?;
    rows.collect::<rusqlite::Result<HashMap<String, String>>>()
        .map_err(from_rusqlite)
}

fn apply_one(conn: &mut Connection, migration: &Migration, checksum: &str) -> Result<()> {
    let tx = conn.transaction().map_err(from_rusqlite)?;
    tx.execute_batch(migration.sql)
        .map_err(|e| migration_error(migration.id, &e.to_string()))?;
    tx.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES (?1, ?2, ?3)",
        params![
            migration.id,
            envstash_core::timestamp::time_to_string(&envstash_core::timestamp::now()),
            checksum
        ],
    )
    .map_err(from_rusqlite)?;
    tx.commit().map_err(from_rusqlite)?;

    tracing::debug!(migration_id = migration.id, "migration applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_database_applies_everything_once() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(apply_migrations(&mut conn).unwrap(), get_migrations().len());
        assert_eq!(apply_migrations(&mut conn).unwrap(), 0);
        assert_eq!(applied_migrations(&conn).unwrap(), vec!["001_initial_schema"]);
    }
}
