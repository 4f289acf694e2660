//! Reference resolution
//!
//! References store the target variable's row id, so resolving one is a
//! single id lookup. References never target references, so there is no
//! chain to follow.

use crate::errors::Result;
use crate::repo::{RefRepo, VarRepo};
use envstash_core::model::{Reference, Variable};
use rusqlite::Connection;

/// Look up a reference and the variable it points at
///
/// # Errors
///
/// `EnvironmentNotFound` when `env_name` is absent, `ReferenceNotFound`
/// when the environment has no reference by that name.
pub fn resolve_target(
    conn: &Connection,
    env_name: &str,
    ref_name: &str,
) -> Result<(Reference, Variable)> {
    let (reference, var_id) = RefRepo::show(conn, env_name, ref_name)?;
    let variable = VarRepo::find_by_id(conn, var_id)?;
    Ok((reference, variable))
}

/// Every reference of `env_name` with its resolved target, as parallel
/// vectors ordered by reference name
pub fn list_resolved(conn: &Connection, env_name: &str) -> Result<(Vec<Reference>, Vec<Variable>)> {
    let rows = RefRepo::list(conn, env_name)?;
    let mut refs = Vec::with_capacity(rows.len());
    let mut vars = Vec::with_capacity(rows.len());
    for (reference, var_id) in rows {
        vars.push(VarRepo::find_by_id(conn, var_id)?);
        refs.push(reference);
    }
    Ok((refs, vars))
}
