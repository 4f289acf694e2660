use crate::errors::{sql_error, Result};
use crate::repo::{entity_key, on_conflict, string_list_column, time_column, EnvRepo, RefRepo, RowId};
use envstash_core::errors::EnvStashError;
use envstash_core::model::{VarCreateArgs, VarUpdateArgs, Variable};
use envstash_core::timestamp::{now, time_to_string};
use envstash_core_types::Sensitive;
use rusqlite::{params, Connection, OptionalExtension, Row};

const SELECT_VAR: &str = "SELECT e.name, v.name, v.comment, v.create_time, v.update_time,
        v.value, v.enabled, v.completions
     FROM variable v
     JOIN environment e ON v.environment_id = e.environment_id";

fn not_found(env_name: &str, name: &str) -> EnvStashError {
    EnvStashError::VariableNotFound {
        env_name: env_name.to_string(),
        name: name.to_string(),
    }
}

fn encode_completions(completions: &[String]) -> Result<String> {
    Ok(serde_json::to_string(completions)?)
}

/// Queries over the `variable` table
pub struct VarRepo;

impl VarRepo {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Variable> {
        Ok(Variable {
            env_name: row.get(0)?,
            name: row.get(1)?,
            comment: row.get(2)?,
            create_time: time_column(row, 3)?,
            update_time: time_column(row, 4)?,
            value: Sensitive::new(row.get(5)?),
            enabled: row.get(6)?,
            completions: string_list_column(row, 7)?,
        })
    }

    /// Insert a variable into an existing environment
    ///
    /// # Errors
    ///
    /// - `EnvironmentNotFound` when the owning environment does not exist
    /// - `AlreadyExists` when the environment already has a variable by that name
    pub fn create(conn: &Connection, args: &VarCreateArgs) -> Result<Variable> {
        let env_id = EnvRepo::find_id(conn, &args.env_name)?;
        let key = entity_key(&args.env_name, &args.name);

        conn.execute(
            "INSERT INTO variable
                (environment_id, name, comment, create_time, update_time, value, enabled, completions)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                env_id,
                args.name,
                args.comment,
                time_to_string(&args.create_time),
                time_to_string(&args.update_time),
                args.value.expose(),
                args.enabled,
                encode_completions(&args.completions)?,
            ],
        )
        .map_err(sql_error("var_create", &key))
        .map_err(|e| {
            on_conflict(e, || EnvStashError::VariableAlreadyExists {
                env_name: args.env_name.clone(),
                name: args.name.clone(),
            })
        })?;

        Ok(Variable {
            env_name: args.env_name.clone(),
            name: args.name.clone(),
            comment: args.comment.clone(),
            create_time: args.create_time,
            update_time: args.update_time,
            value: args.value.clone(),
            enabled: args.enabled,
            completions: args.completions.clone(),
        })
    }

    /// Delete by name; returns the number of deleted rows
    ///
    /// # Errors
    ///
    /// `ReferencedByOther` when any reference targets the variable.
    pub fn delete(conn: &Connection, env_name: &str, name: &str) -> Result<usize> {
        let env_id = EnvRepo::find_id(conn, env_name)?;
        let key = entity_key(env_name, name);

        let var_id: Option<RowId> = conn
            .query_row(
                "SELECT variable_id FROM variable WHERE environment_id = ?1 AND name = ?2",
                params![env_id, name],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_error("var_delete", &key))?;

        if let Some(var_id) = var_id {
            let referenced_by: Vec<String> = RefRepo::list_by_target(conn, var_id)?
                .into_iter()
                .map(|r| entity_key(&r.env_name, &r.name))
                .collect();
            if !referenced_by.is_empty() {
                return Err(EnvStashError::VariableReferenced {
                    env_name: env_name.to_string(),
                    name: name.to_string(),
                    referenced_by,
                }
                .into());
            }
        }

        conn.execute(
            "DELETE FROM variable WHERE environment_id = ?1 AND name = ?2",
            params![env_id, name],
        )
        .map_err(sql_error("var_delete", &key))
    }

    /// Variables owned by `env_name`, ordered by name
    pub fn list(conn: &Connection, env_name: &str) -> Result<Vec<Variable>> {
        let env_id = EnvRepo::find_id(conn, env_name)?;
        let mut stmt = conn
            .prepare(&format!("{} WHERE v.environment_id = ?1 ORDER BY v.name ASC", SELECT_VAR))
            .map_err(sql_error("var_list", env_name))?;
        let vars = stmt
            .query_map([env_id], Self::from_row)
            .map_err(sql_error("var_list", env_name))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(sql_error("var_list", env_name))?;
        Ok(vars)
    }

    /// Resolve `(env_name, name)` to the variable's row id
    ///
    /// # Errors
    ///
    /// `EnvironmentNotFound` or `VariableNotFound`.
    pub fn find_id(conn: &Connection, env_name: &str, name: &str) -> Result<RowId> {
        let env_id = EnvRepo::find_id(conn, env_name)?;
        conn.query_row(
            "SELECT variable_id FROM variable WHERE environment_id = ?1 AND name = ?2",
            params![env_id, name],
            |row| row.get(0),
        )
        .optional()
        .map_err(sql_error("var_find_id", entity_key(env_name, name)))?
        .ok_or_else(|| not_found(env_name, name).into())
    }

    /// Fetch a variable by row id
    pub fn find_by_id(conn: &Connection, id: RowId) -> Result<Variable> {
        conn.query_row(
            &format!("{} WHERE v.variable_id = ?1", SELECT_VAR),
            [id],
            Self::from_row,
        )
        .map_err(sql_error("var_find_by_id", id.to_string()))
    }

    pub fn show(conn: &Connection, env_name: &str, name: &str) -> Result<Variable> {
        let id = Self::find_id(conn, env_name, name)?;
        Self::find_by_id(conn, id)
    }

    /// Partially update a variable
    ///
    /// `args.env_name` moves it to another environment and `args.name`
    /// renames it. Returns the variable's `(env_name, name)` after the update.
    pub fn update(
        conn: &Connection,
        env_name: &str,
        name: &str,
        args: VarUpdateArgs,
    ) -> Result<(String, String)> {
        let id = Self::find_id(conn, env_name, name)?;
        let key = entity_key(env_name, name);

        let new_env_name = args.env_name.coalesce_required("env_name")?;
        let new_env_id = new_env_name
            .as_deref()
            .map(|n| EnvRepo::find_id(conn, n))
            .transpose()?;
        let new_name = args.name.coalesce_required("name")?;
        let comment = args.comment.coalesce_or(String::new());
        let create_time = args.create_time.coalesce_required("create_time")?;
        let update_time = args.update_time.coalesce_or(now());
        let value = args.value.coalesce_required("value")?;
        let enabled = args.enabled.coalesce_or(true);
        let completions = args
            .completions
            .coalesce_or(Vec::new())
            .map(|c| encode_completions(&c))
            .transpose()?;

        conn.execute(
            "UPDATE variable SET
                environment_id = COALESCE(?1, environment_id),
                name = COALESCE(?2, name),
                comment = COALESCE(?3, comment),
                create_time = COALESCE(?4, create_time),
                update_time = COALESCE(?5, update_time),
                value = COALESCE(?6, value),
                enabled = COALESCE(?7, enabled),
                completions = COALESCE(?8, completions)
             WHERE variable_id = ?9",
            params![
                new_env_id,
                new_name,
                comment,
                create_time.map(|t| time_to_string(&t)),
                update_time.map(|t| time_to_string(&t)),
                value.as_ref().map(|v| v.expose()),
                enabled,
                completions,
                id,
            ],
        )
        .map_err(sql_error("var_update", &key))
        .map_err(|e| {
            on_conflict(e, || EnvStashError::VariableAlreadyExists {
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
