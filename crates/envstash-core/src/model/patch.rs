//! Tri-state field updates
//!
//! Update arguments use [`Patch`] for every field so that "not provided",
//! "reset to default" and "set to a value" are distinct.

use crate::errors::{EnvStashError, ExError};

/// A single field of a partial update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Leave the stored value unchanged
    Keep,
    /// Reset the stored value to the field's default
    Clear,
    /// Replace the stored value
    Set(T),
}

impl<T> Patch<T> {
    /// `Some(v)` becomes `Set(v)`, `None` becomes `Keep`
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Set(v),
            None => Patch::Keep,
        }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Keep => Patch::Keep,
            Patch::Clear => Patch::Clear,
            Patch::Set(v) => Patch::Set(f(v)),
        }
    }

    /// Bind value for a `COALESCE(?, column)` update of a clearable field
    ///
    /// `None` keeps the column; `Clear` binds `default`.
    pub fn coalesce_or(self, default: T) -> Option<T> {
        match self {
            Patch::Keep => None,
            Patch::Clear => Some(default),
            Patch::Set(v) => Some(v),
        }
    }

    /// Bind value for a field that has no default
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the patch is `Clear`.
    pub fn coalesce_required(self, field: &str) -> Result<Option<T>, ExError> {
        match self {
            Patch::Keep => Ok(None),
            Patch::Clear => Err(EnvStashError::FieldNotClearable {
                field: field.to_string(),
            }
            .into()),
            Patch::Set(v) => Ok(Some(v)),
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Keep
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        Patch::from_option(value)
    }
}
