//! envstash engine - the transactional service
//!
//! Binds the store's repositories to a connection or an open transaction
//! and exposes them through [`envstash_core::Service`]. [`TracedService`]
//! decorates any service with structured operation logging.

pub mod service;
pub mod traced;

pub use service::{DbHandle, EnvService};
pub use traced::{Observer, TracedService};
