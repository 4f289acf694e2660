use crate::errors::{sql_error, Result};
use crate::repo::{entity_key, on_conflict, time_column, EnvRepo, RowId, VarRepo};
use envstash_core::errors::EnvStashError;
use envstash_core::model::{RefCreateArgs, RefUpdateArgs, Reference};
use envstash_core::timestamp::{now, time_to_string};
use rusqlite::{params, Connection, OptionalExtension, Row};

// The target's env and name come from the join, so they follow renames
// and moves of the variable.
const SELECT_REF: &str = "SELECT re.name, r.name, r.comment, r.create_time, r.update_time,
        te.name, v.name, r.enabled, r.variable_id
     FROM reference r
     JOIN environment re ON r.environment_id = re.environment_id
     JOIN variable v ON r.variable_id = v.variable_id
     JOIN environment te ON v.environment_id = te.environment_id";

fn not_found(env_name: &str, name: &str) -> EnvStashError {
    EnvStashError::ReferenceNotFound {
        env_name: env_name.to_string(),
        name: name.to_string(),
    }
}

/// Queries over the `reference` table
pub struct RefRepo;

impl RefRepo {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<(Reference, RowId)> {
        Ok((
            Reference {
                env_name: row.get(0)?,
                name: row.get(1)?,
                comment: row.get(2)?,
                create_time: time_column(row, 3)?,
                update_time: time_column(row, 4)?,
                ref_env_name: row.get(5)?,
                ref_var_name: row.get(6)?,
                enabled: row.get(7)?,
            },
            row.get(8)?,
        ))
    }

    fn query(
        conn: &Connection,
        op: &str,
        entity: &str,
        filter: &str,
        param: RowId,
    ) -> Result<Vec<(Reference, RowId)>> {
        let mut stmt = conn
            .prepare(&format!("{} {}", SELECT_REF, filter))
            .map_err(sql_error(op, entity))?;
        let rows = stmt
            .query_map([param], Self::from_row)
            .map_err(sql_error(op, entity))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(sql_error(op, entity))?;
        Ok(rows)
    }

    /// Insert a reference to an existing variable
    ///
    /// # Errors
    ///
    /// - `EnvironmentNotFound` / `VariableNotFound` when the owner or target is missing
    /// - `AlreadyExists` when the environment already has a reference by that name
    pub fn create(conn: &Connection, args: &RefCreateArgs) -> Result<Reference> {
        let env_id = EnvRepo::find_id(conn, &args.env_name)?;
        let var_id = VarRepo::find_id(conn, &args.ref_env_name, &args.ref_var_name)?;

        conn.execute(
            "INSERT INTO reference
                (environment_id, name, comment, create_time, update_time, variable_id, enabled)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                env_id,
                args.name,
                args.comment,
                time_to_string(&args.create_time),
                time_to_string(&args.update_time),
                var_id,
                args.enabled,
            ],
        )
        .map_err(sql_error("ref_create", entity_key(&args.env_name, &args.name)))
        .map_err(|e| {
            on_conflict(e, || EnvStashError::ReferenceAlreadyExists {
                env_name: args.env_name.clone(),
                name: args.name.clone(),
            })
        })?;

        Ok(Reference {
            env_name: args.env_name.clone(),
            name: args.name.clone(),
            comment: args.comment.clone(),
            create_time: args.create_time,
            update_time: args.update_time,
            ref_env_name: args.ref_env_name.clone(),
            ref_var_name: args.ref_var_name.clone(),
            enabled: args.enabled,
        })
    }

    /// Delete by name; returns the number of deleted rows
    pub fn delete(conn: &Connection, env_name: &str, name: &str) -> Result<usize> {
        let env_id = EnvRepo::find_id(conn, env_name)?;
        conn.execute(
            "DELETE FROM reference WHERE environment_id = ?1 AND name = ?2",
            params![env_id, name],
        )
        .map_err(sql_error("ref_delete", entity_key(env_name, name)))
    }

    /// References owned by `env_name` with their target row ids, ordered by name
    pub fn list(conn: &Connection, env_name: &str) -> Result<Vec<(Reference, RowId)>> {
        let env_id = EnvRepo::find_id(conn, env_name)?;
        Self::query(
            conn,
            "ref_list",
            env_name,
            "WHERE r.environment_id = ?1 ORDER BY r.name ASC",
            env_id,
        )
    }

    /// Every reference, in any environment, that targets variable `var_id`
    pub fn list_by_target(conn: &Connection, var_id: RowId) -> Result<Vec<Reference>> {
        let rows = Self::query(
            conn,
            "ref_list_by_target",
            &var_id.to_string(),
            "WHERE r.variable_id = ?1 ORDER BY re.name ASC, r.name ASC",
            var_id,
        )?;
        Ok(rows.into_iter().map(|(r, _)| r).collect())
    }

    /// Resolve `(env_name, name)` to the reference's row id
    pub fn find_id(conn: &Connection, env_name: &str, name: &str) -> Result<RowId> {
        let env_id = EnvRepo::find_id(conn, env_name)?;
        conn.query_row(
            "SELECT reference_id FROM reference WHERE environment_id = ?1 AND name = ?2",
            params![env_id, name],
            |row| row.get(0),
        )
        .optional()
        .map_err(sql_error("ref_find_id", entity_key(env_name, name)))?
        .ok_or_else(|| not_found(env_name, name).into())
    }

    /// A reference and the row id of the variable it targets
    pub fn show(conn: &Connection, env_name: &str, name: &str) -> Result<(Reference, RowId)> {
        let id = Self::find_id(conn, env_name, name)?;
        Self::query(
            conn,
            "ref_show",
            &entity_key(env_name, name),
            "WHERE r.reference_id = ?1",
            id,
        )?
        .pop()
        .ok_or_else(|| not_found(env_name, name).into())
    }

    /// Partially update a reference
    ///
    /// `args.env_name` moves it and `args.name` renames it. Retargeting
    /// needs both `ref_env_name` and `ref_var_name`. Returns the
    /// reference's `(env_name, name)` after the update.
    pub fn update(
        conn: &Connection,
        env_name: &str,
        name: &str,
        args: RefUpdateArgs,
    ) -> Result<(String, String)> {
        let id = Self::find_id(conn, env_name, name)?;
        let key = entity_key(env_name, name);

        let new_env_name = args.env_name.coalesce_required("env_name")?;
        let new_env_id = new_env_name
            .as_deref()
            .map(|n| EnvRepo::find_id(conn, n))
            .transpose()?;

        let ref_env = args.ref_env_name.coalesce_required("ref_env_name")?;
        let ref_var = args.ref_var_name.coalesce_required("ref_var_name")?;
        let new_var_id = match (ref_env, ref_var) {
            (None, None) => None,
            (Some(ref_env), Some(ref_var)) => Some(VarRepo::find_id(conn, &ref_env, &ref_var)?),
            _ => return Err(EnvStashError::IncompleteRefTarget.into()),
        };

        let new_name = args.name.coalesce_required("name")?;
        let comment = args.comment.coalesce_or(String::new());
        let create_time = args.create_time.coalesce_required("create_time")?;
        let update_time = args.update_time.coalesce_or(now());
        let enabled = args.enabled.coalesce_or(true);

        conn.execute(
            "UPDATE reference SET
                environment_id = COALESCE(?1, environment_id),
                name = COALESCE(?2, name),
                comment = COALESCE(?3, comment),
                create_time = COALESCE(?4, create_time),
                update_time = COALESCE(?5, update_time),
                variable_id = COALESCE(?6, variable_id),
                enabled = COALESCE(?7, enabled)
             WHERE reference_id = ?8",
            params![
                new_env_id,
                new_name,
                comment,
                create_time.map(|t| time_to_string(&t)),
                update_time.map(|t| time_to_string(&t)),
                new_var_id,
                enabled,
                id,
            ],
        )
        .map_err(sql_error("ref_update", &key))
        .map_err(|e| {
            on_conflict(e, || EnvStashError::ReferenceAlreadyExists {
                env_name: new_env_name.clone().unwrap_or_else(|| env_name.to_string()),
                name: new_name.clone().unwrap_or_else(|| name.to_string()),
            })
        })?;

        Ok((
            new_env_name.unwrap_or_else(|| env_name.to_string()),
            new_name.unwrap_or_else(|| name.to_string()),
        ))
    }
}
