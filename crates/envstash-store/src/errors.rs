//! Error handling for envstash-store
//!
//! Every rusqlite error is mapped into the core taxonomy here, once.

use envstash_core::errors::{ExError, ExErrorKind};
use rusqlite::ffi;

pub type Result<T> = std::result::Result<T, ExError>;

/// A migration's SQL failed to apply
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_entity_id(migration_id)
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// An applied migration no longer matches the SQL embedded in this build
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_entity_id(migration_id)
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Map a rusqlite error into the core taxonomy
///
/// Constraint violations become `AlreadyExists` or `ReferencedByOther`, an
/// interrupted statement (deadline hit) becomes `Timeout`, everything else
/// is `Persistence`.
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    let kind = match &err {
        rusqlite::Error::SqliteFailure(e, _) => match e.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                ExErrorKind::AlreadyExists
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => ExErrorKind::ReferencedByOther,
            _ if e.code == rusqlite::ErrorCode::OperationInterrupted => ExErrorKind::Timeout,
            _ => ExErrorKind::Persistence,
        },
        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::InvalidColumnType(..) => ExErrorKind::Serialization,
        _ => ExErrorKind::Persistence,
    };
    // The caller knows the operation; the service layer fills it in.
    ExError::new(kind).with_message(err.to_string())
}

/// [`from_rusqlite`] with the operation and entity key filled in
pub fn sql_error(op: &str, entity_id: impl Into<String>) -> impl FnOnce(rusqlite::Error) -> ExError {
    let op = op.to_string();
    let entity_id = entity_id.into();
    move |err| from_rusqlite(err).with_op(op).with_entity_id(entity_id)
}
