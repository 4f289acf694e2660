//! Operation lifecycle macros
//!
//! A service call logs one `start` event and then exactly one of `end` or
//! `end_error`, each tagged with the calling module as `component` and the
//! operation name as `op`. Extra `key = value` fields pass straight through
//! to `tracing`; entity keys go there, variable values never do.

#[doc(hidden)]
#[macro_export]
macro_rules! __envstash_op_event {
    ($level:ident, $op:expr, $event:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $event,
            $($($field)*)?
        )
    };
}

/// `start` event for `op`
///
/// ```
/// # use envstash_core::log_op_start;
/// log_op_start!("var_create", env_name = "dev", var_name = "PORT");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__envstash_op_event!(
            info,
            $op,
            $crate::types::schema::EVENT_START
            $(, $($field)*)?
        )
    };
}

/// `end` event for `op`; `duration_ms` is required
///
/// ```
/// # use envstash_core::log_op_end;
/// log_op_end!("var_create", duration_ms = 3u64, env_name = "dev");
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__envstash_op_event!(
            info,
            $op,
            $crate::types::schema::EVENT_END,
            duration_ms = $duration
            $(, $($field)*)?
        )
    };
}

/// `end_error` event for `op`
///
/// `err` is anything convertible into `ExError`; its kind and stable code
/// are recorded as `err_kind` and `err_code`. The message is not, since it
/// may quote user input.
///
/// ```
/// # use envstash_core::log_op_error;
/// # use envstash_core::errors::EnvStashError;
/// let err = EnvStashError::EnvironmentNotFound { name: "dev".to_string() };
/// log_op_error!("env_show", err, duration_ms = 1u64);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__envstash_op_event!(
            error,
            $op,
            $crate::types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code()
            $(, $($field)*)?
        )
    }};
}
