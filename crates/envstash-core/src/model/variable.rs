use chrono::{DateTime, Utc};
use envstash_core_types::Sensitive;

use super::Patch;

/// A name/value pair owned by exactly one environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub env_name: String,
    pub name: String,
    pub comment: String,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub value: Sensitive<String>,
    pub enabled: bool,
    /// Candidate values offered by shell completion, in display order
    pub completions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarCreateArgs {
    pub env_name: String,
    pub name: String,
    pub comment: String,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub value: Sensitive<String>,
    pub enabled: bool,
    pub completions: Vec<String>,
}

impl VarCreateArgs {
    pub fn new(
        env_name: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            env_name: env_name.into(),
            name: name.into(),
            comment: String::new(),
            create_time: now,
            update_time: now,
            value: Sensitive::new(value.into()),
            enabled: true,
            completions: Vec::new(),
        }
    }
}

/// Partial update of a variable
///
/// `env_name` moves the variable to another environment, `name` renames it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarUpdateArgs {
    pub env_name: Patch<String>,
    pub name: Patch<String>,
    pub comment: Patch<String>,
    pub create_time: Patch<DateTime<Utc>>,
    pub update_time: Patch<DateTime<Utc>>,
    pub value: Patch<Sensitive<String>>,
    pub enabled: Patch<bool>,
    pub completions: Patch<Vec<String>>,
}
