//! Structured logging
//!
//! The CLI calls [`init`] once with the profile chosen by `--log-format`;
//! library crates only emit events. Output always goes to stderr because
//! stdout carries shell scripts meant for `eval`.
//!
//! Service operations are logged through [`log_op_start!`](crate::log_op_start),
//! [`log_op_end!`](crate::log_op_end) and [`log_op_error!`](crate::log_op_error).
//! Fields name entities (`env_name`, `var_name`, `ref_name`); variable values
//! are never logged, and anything that has to carry one holds it as
//! [`Sensitive`](envstash_core_types::Sensitive).

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
