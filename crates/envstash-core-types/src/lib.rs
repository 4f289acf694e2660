//! Core types shared across envstash crates
//!
//! This crate provides foundational types used by the error, logging and
//! service layers:
//!
//! - **Request context**: RequestId and RequestContext (request id + deadline)
//! - **Sensitive data**: Sensitive<T> marker for automatic redaction
//! - **Schema constants**: Canonical log field keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::{RequestContext, RequestId};
pub use sensitive::Sensitive;
