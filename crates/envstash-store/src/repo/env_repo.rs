use crate::errors::{sql_error, Result};
use crate::repo::{entity_key, on_conflict, time_column, RefRepo, RowId};
use envstash_core::errors::EnvStashError;
use envstash_core::model::{EnvCreateArgs, EnvUpdateArgs, Environment};
use envstash_core::timestamp::{now, time_to_string};
use rusqlite::{params, Connection, OptionalExtension, Row};

const SELECT_ENV: &str =
    "SELECT name, comment, create_time, update_time, enabled FROM environment";

/// Queries over the `environment` table
pub struct EnvRepo;

impl EnvRepo {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Environment> {
        Ok(Environment {
            name: row.get(0)?,
            comment: row.get(1)?,
            create_time: time_column(row, 2)?,
            update_time: time_column(row, 3)?,
            enabled: row.get(4)?,
        })
    }

    /// Insert an environment
    ///
    /// # Errors
    ///
    /// `AlreadyExists` when the name is taken.
    pub fn create(conn: &Connection, args: &EnvCreateArgs) -> Result<Environment> {
        conn.execute(
            "INSERT INTO environment (name, comment, create_time, update_time, enabled)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                args.name,
                args.comment,
                time_to_string(&args.create_time),
                time_to_string(&args.update_time),
                args.enabled,
            ],
        )
        .map_err(sql_error("env_create", &args.name))
        .map_err(|e| {
            on_conflict(e, || EnvStashError::EnvironmentAlreadyExists {
                name: args.name.clone(),
            })
        })?;

        Ok(Environment {
            name: args.name.clone(),
            comment: args.comment.clone(),
            create_time: args.create_time,
            update_time: args.update_time,
            enabled: args.enabled,
        })
    }

    /// Delete by name, cascading to owned variables and references
    ///
    /// Returns the number of deleted environment rows (0 or 1).
    ///
    /// # Errors
    ///
    /// `EnvironmentReferenced` naming every `env/ref` in another environment
    /// that targets one of this environment's variables.
    pub fn delete(conn: &Connection, name: &str) -> Result<usize> {
        let env_id: Option<RowId> = conn
            .query_row(
                "SELECT environment_id FROM environment WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_error("env_delete", name))?;
        let Some(env_id) = env_id else {
            return Ok(0);
        };

        let mut stmt = conn
            .prepare("SELECT variable_id FROM variable WHERE environment_id = ?1 ORDER BY name")
            .map_err(sql_error("env_delete", name))?;
        let var_ids = stmt
            .query_map([env_id], |row| row.get::<_, RowId>(0))
            .map_err(sql_error("env_delete", name))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(sql_error("env_delete", name))?;

        // References owned by this environment go away with it.
        let mut referenced_by = Vec::new();
        for var_id in var_ids {
            referenced_by.extend(
                RefRepo::list_by_target(conn, var_id)?
                    .into_iter()
                    .filter(|r| r.env_name != name)
                    .map(|r| entity_key(&r.env_name, &r.name)),
            );
        }
        if !referenced_by.is_empty() {
            referenced_by.sort();
            return Err(EnvStashError::EnvironmentReferenced {
                name: name.to_string(),
                referenced_by,
            }
            .into());
        }

        conn.execute("DELETE FROM environment WHERE environment_id = ?1", [env_id])
            .map_err(sql_error("env_delete", name))
    }

    /// All environments ordered by name
    pub fn list(conn: &Connection) -> Result<Vec<Environment>> {
        let mut stmt = conn
            .prepare(&format!("{} ORDER BY name ASC", SELECT_ENV))
            .map_err(sql_error("env_list", ""))?;
        let envs = stmt
            .query_map([], Self::from_row)
            .map_err(sql_error("env_list", ""))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(sql_error("env_list", ""))?;
        Ok(envs)
    }

    /// Resolve a name to its row id
    ///
    /// # Errors
    ///
    /// `EnvironmentNotFound` when no environment has that name.
    pub fn find_id(conn: &Connection, name: &str) -> Result<RowId> {
        conn.query_row(
            "SELECT environment_id FROM environment WHERE name = ?1",
            [name],
            |row| row.get(0),
        )
        .optional()
        .map_err(sql_error("env_find_id", name))?
        .ok_or_else(|| {
            EnvStashError::EnvironmentNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }

    pub fn show(conn: &Connection, name: &str) -> Result<Environment> {
        conn.query_row(
            &format!("{} WHERE name = ?1", SELECT_ENV),
            [name],
            Self::from_row,
        )
        .optional()
        .map_err(sql_error("env_show", name))?
        .ok_or_else(|| {
            EnvStashError::EnvironmentNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Partially update an environment; `args.name` renames it
    ///
    /// Returns the environment's name after the update.
    pub fn update(conn: &Connection, name: &str, args: EnvUpdateArgs) -> Result<String> {
        let id = Self::find_id(conn, name)?;

        let new_name = args.name.coalesce_required("name")?;
        let comment = args.comment.coalesce_or(String::new());
        let create_time = args.create_time.coalesce_required("create_time")?;
        let update_time = args.update_time.coalesce_or(now());
        let enabled = args.enabled.coalesce_or(true);

        let updated = conn
            .execute(
                "UPDATE environment SET
                    name = COALESCE(?1, name),
                    comment = COALESCE(?2, comment),
                    create_time = COALESCE(?3, create_time),
                    update_time = COALESCE(?4, update_time),
                    enabled = COALESCE(?5, enabled)
                 WHERE environment_id = ?6",
                params![
                    new_name,
                    comment,
                    create_time.map(|t| time_to_string(&t)),
                    update_time.map(|t| time_to_string(&t)),
                    enabled,
                    id,
                ],
            )
            .map_err(sql_error("env_update", name))
            .map_err(|e| {
                on_conflict(e, || EnvStashError::EnvironmentAlreadyExists {
                    name: new_name.clone().unwrap_or_default(),
                })
            })?;

        if updated == 0 {
            return Err(EnvStashError::EnvironmentNotFound {
                name: name.to_string(),
            }
            .into());
        }
        Ok(new_name.unwrap_or_else(|| name.to_string()))
    }
}
