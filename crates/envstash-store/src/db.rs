//! Database connection management
//!
//! Opening a database always configures it and brings the schema up to date.

use crate::errors::{from_rusqlite, Result};
use crate::migrations::apply_migrations;
use envstash_core::errors::{ExError, ExErrorKind};
use rusqlite::Connection;
use std::path::Path;
use std::time::Instant;

/// Number of SQLite VM instructions between deadline checks
const PROGRESS_INTERVAL: i32 = 1000;

/// Open (creating if needed) the database at `path`, configure it and
/// apply pending migrations
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("db_open")
                .with_entity_id(parent.display().to_string())
                .with_message(e.to_string())
        })?;
    }
    let mut conn = Connection::open(path).map_err(from_rusqlite)?;
    configure(&conn)?;
    apply_migrations(&mut conn)?;
    tracing::debug!(path = %path.display(), "database opened");
    Ok(conn)
}

/// Open a configured, migrated in-memory database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().map_err(from_rusqlite)?;
    configure(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

/// Configure a connection with the settings the schema relies on
pub fn configure(conn: &Connection) -> Result<()> {
    // Cascades and the referenced-variable check need foreign keys
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(from_rusqlite)?;
    // In-memory databases answer "memory" and keep their journal mode
    let mode: String = conn
        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
        .map_err(from_rusqlite)?;
    tracing::trace!(journal_mode = %mode, "connection configured");

    Ok(())
}

/// Interrupt statements on `conn` once `deadline` passes
///
/// An interrupted statement fails with `SQLITE_INTERRUPT`, which
/// [`from_rusqlite`] reports as `Timeout`. `None` removes the handler.
pub fn set_deadline(conn: &Connection, deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => {
            conn.progress_handler(PROGRESS_INTERVAL, Some(move || Instant::now() >= deadline))
        }
        None => conn.progress_handler(PROGRESS_INTERVAL, None::<fn() -> bool>),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory_enables_foreign_keys() {
        let conn = open_in_memory().unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("envstash.db");
        let conn = open(&path).unwrap();
        drop(conn);
        assert!(path.exists());
    }

    #[test]
    fn test_expired_deadline_interrupts_statement() {
        let conn = open_in_memory().unwrap();
        set_deadline(&conn, Some(Instant::now()));
        let err = conn
            .query_row(
                "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 1000000)
                 SELECT count(*) FROM c",
                [],
                |row| row.get::<_, i64>(0),
            )
            .map_err(from_rusqlite)
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Timeout);

        set_deadline(&conn, None);
        let n: i64 = conn.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
        assert_eq!(n, 1);
    }
}
