pub mod environment;
pub mod exportable;
pub mod patch;
pub mod reference;
pub mod variable;

pub use environment::{EnvCreateArgs, EnvUpdateArgs, Environment};
pub use exportable::Exportable;
pub use patch::Patch;
pub use reference::{RefCreateArgs, RefUpdateArgs, Reference};
pub use variable::{VarCreateArgs, VarUpdateArgs, Variable};

use crate::errors::{EnvStashError, ExError};

/// Reject names that cannot be used as lookup keys
///
/// Names are otherwise opaque: environment names are usually absolute
/// directory paths, variable names usually shell identifiers.
pub fn validate_name(kind: &str, name: &str) -> Result<(), ExError> {
    if name.trim().is_empty() {
        return Err(EnvStashError::InvalidName {
            reason: format!("{} name must not be empty", kind),
        }
        .into());
    }
    Ok(())
}
