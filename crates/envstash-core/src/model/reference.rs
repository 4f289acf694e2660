use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Patch;

/// A named alias for a variable owned by any environment
///
/// The target is held by key, never by value: the variable's current value
/// is looked up each time the reference is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub env_name: String,
    pub name: String,
    pub comment: String,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub ref_env_name: String,
    pub ref_var_name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefCreateArgs {
    pub env_name: String,
    pub name: String,
    pub comment: String,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub ref_env_name: String,
    pub ref_var_name: String,
    pub enabled: bool,
}

impl RefCreateArgs {
    pub fn new(
        env_name: impl Into<String>,
        name: impl Into<String>,
        ref_env_name: impl Into<String>,
        ref_var_name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            env_name: env_name.into(),
            name: name.into(),
            comment: String::new(),
            create_time: now,
            update_time: now,
            ref_env_name: ref_env_name.into(),
            ref_var_name: ref_var_name.into(),
            enabled: true,
        }
    }
}

/// Partial update of a reference
///
/// Retargeting needs both `ref_env_name` and `ref_var_name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefUpdateArgs {
    pub env_name: Patch<String>,
    pub name: Patch<String>,
    pub comment: Patch<String>,
    pub create_time: Patch<DateTime<Utc>>,
    pub update_time: Patch<DateTime<Utc>>,
    pub ref_env_name: Patch<String>,
    pub ref_var_name: Patch<String>,
    pub enabled: Patch<bool>,
}
