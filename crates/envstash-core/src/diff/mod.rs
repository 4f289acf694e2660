//! Shell export diffing
//!
//! When the shell moves from one directory to another, the variables of the
//! old environment have to be unset and those of the new one exported. The
//! engine decides which keys need touching given what the live shell
//! currently holds; the script module renders that decision as zsh.
//!
//! ## Guarantees
//!
//! - **Pure**: the engine reads the live environment only through the
//!   lookup function it is given.
//! - **Determinism**: every bucket is sorted by key, so scripts are stable.
//! - **Minimal output**: a key whose live value already matches is reported
//!   as unchanged and never re-exported.

pub mod engine;
pub mod model;
pub mod script;

pub use engine::{chdir_inputs, compute_export_changes, lookup_map, lookup_process_env};
pub use model::{ExportChanges, KeyValue};
