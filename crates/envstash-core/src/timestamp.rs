//! Timestamp codec
//!
//! Timestamps are stored as RFC3339 text in UTC with whole-second
//! precision. Encoding truncates sub-second digits, so decoding an encoded
//! value yields the original instant truncated to the second.

use crate::errors::{EnvStashError, ExError};
use chrono::{DateTime, SecondsFormat, SubsecRound, TimeZone, Utc};

/// Format a timestamp as UTC RFC3339 (`2024-05-01T12:00:00Z`)
pub fn time_to_string<Tz: TimeZone>(t: &DateTime<Tz>) -> String {
    t.with_timezone(&Utc)
        .trunc_subsecs(0)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse RFC3339 text (any offset) into a UTC timestamp truncated to seconds
pub fn string_to_time(s: &str) -> Result<DateTime<Utc>, ExError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc).trunc_subsecs(0))
        .map_err(|e| {
            EnvStashError::InvalidTimestamp {
                value: s.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
}

/// Current time, truncated to what the store can represent
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}
