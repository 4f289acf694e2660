use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Patch;

/// A named collection of variables and references
///
/// The name is usually a directory path so the shell hook can switch
/// environments on `cd`, but any label works.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    pub comment: String,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    /// Disabled environments project every exportable as disabled
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvCreateArgs {
    pub name: String,
    pub comment: String,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub enabled: bool,
}

impl EnvCreateArgs {
    /// Enabled environment with no comment, created and updated `now`
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            comment: String::new(),
            create_time: now,
            update_time: now,
            enabled: true,
        }
    }
}

/// Partial update of an environment; `name` renames it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvUpdateArgs {
    pub name: Patch<String>,
    pub comment: Patch<String>,
    pub create_time: Patch<DateTime<Utc>>,
    pub update_time: Patch<DateTime<Utc>>,
    pub enabled: Patch<bool>,
}
