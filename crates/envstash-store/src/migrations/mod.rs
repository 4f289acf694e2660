//! Schema migrations
//!
//! SQL files under `migrations/` are compiled into the binary. Each one is
//! applied at most once, in its own transaction, and its checksum is kept
//! so that editing an already shipped migration is caught on the next open.

mod checksums;
mod embedded;
mod runner;

pub use embedded::{get_migrations, Migration};
pub use runner::{applied_migrations, apply_migrations};
