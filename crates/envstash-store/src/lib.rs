//! envstash store - SQLite persistence
//!
//! Provides:
//! - Connection setup (pragmas, deadline interrupts)
//! - Embedded schema migrations with checksums
//! - Per-table repositories for environments, variables and references
//! - Reference resolution across environments

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;
pub mod resolve;

// Re-export key types
pub use errors::Result;
pub use repo::{EnvRepo, RefRepo, RowId, VarRepo};
pub use resolve::{list_resolved, resolve_target};
