//! Redaction for variable values
//!
//! A variable's value may be a token or password, so it travels as
//! [`Sensitive<String>`] from the CLI down to the SQL parameter. Formatting
//! never shows the payload: log fields, error messages and `{:?}` dumps of
//! whole structs all print a fixed placeholder instead.

use std::fmt;

const PLACEHOLDER: &str = "***REDACTED***";

/// A value that formats as `***REDACTED***`
///
/// ```
/// use envstash_core_types::Sensitive;
///
/// let token = Sensitive::from("ghp_abc123");
/// assert_eq!(format!("{:?} {}", token, token), "***REDACTED*** ***REDACTED***");
/// assert_eq!(token.as_str(), "ghp_abc123");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the payload
    ///
    /// Only output paths that are meant to show the value call this:
    /// export scripts, unmasked `show` output and database writes.
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl Sensitive<String> {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Sensitive<String> {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Sensitive<String> {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

macro_rules! redacted_fmt {
    ($($trait:ident),+) => {
        $(
            impl<T> fmt::$trait for Sensitive<T> {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(PLACEHOLDER)
                }
            }
        )+
    };
}

redacted_fmt!(Debug, Display);
