//! Repository layer: one unit struct per table
//!
//! Every function takes a `&Connection`. A `rusqlite::Transaction` derefs
//! to one, so the same functions run inside or outside a transaction; none
//! of them ever opens a connection.

pub mod env_repo;
pub mod ref_repo;
pub mod var_repo;

pub use env_repo::EnvRepo;
pub use ref_repo::RefRepo;
pub use var_repo::VarRepo;

use chrono::{DateTime, Utc};
use envstash_core::timestamp::string_to_time;
use rusqlite::types::Type;
use rusqlite::Row;

/// Internal row id; never leaves the store
pub type RowId = i64;

/// Read an RFC3339 text column
pub(crate) fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    string_to_time(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a JSON array-of-strings column
pub(crate) fn string_list_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn entity_key(env_name: &str, name: &str) -> String {
    format!("{}/{}", env_name, name)
}

/// Replace a generic `AlreadyExists` with the entity-specific domain error
pub(crate) fn on_conflict(
    err: envstash_core::ExError,
    conflict: impl FnOnce() -> envstash_core::EnvStashError,
) -> envstash_core::ExError {
    if err.kind() == envstash_core::ExErrorKind::AlreadyExists {
        let op = err.op().unwrap_or_default().to_string();
        envstash_core::ExError::from(conflict())
            .with_op(op)
            .with_source(err)
    } else {
        err
    }
}
