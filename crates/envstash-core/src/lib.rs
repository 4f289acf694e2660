//! envstash core - domain model and pure logic
//!
//! This crate holds everything that does not touch the database:
//! - Environment, Variable and Reference models with tri-state patches
//! - The [`Service`] trait every storage-backed implementation provides
//! - The exportable projector (variables plus resolved references)
//! - The export diff engine and zsh script rendering
//! - The error taxonomy and structured logging facility

pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod timestamp;

pub use envstash_core_types as types;

// Re-export commonly used types
pub use errors::{EnvStashError, ExError, ExErrorKind, Result};
pub use model::{
    EnvCreateArgs, EnvUpdateArgs, Environment, Exportable, Patch, RefCreateArgs, RefUpdateArgs,
    Reference, VarCreateArgs, VarUpdateArgs, Variable,
};
pub use ops::{with_tx_returning, Service};
