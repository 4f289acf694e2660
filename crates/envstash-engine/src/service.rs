//! SQLite-backed [`Service`]

use envstash_core::errors::{EnvStashError, ExError, ExErrorKind, Result};
use envstash_core::model::{
    validate_name, EnvCreateArgs, EnvUpdateArgs, Environment, Exportable, RefCreateArgs,
    RefUpdateArgs, Reference, VarCreateArgs, VarUpdateArgs, Variable,
};
use envstash_core::ops::projection::project_environment;
use envstash_core::ops::service::TxBody;
use envstash_core::Service;
use envstash_core_types::RequestContext;
use envstash_store::errors::from_rusqlite;
use envstash_store::{db, list_resolved, resolve_target, EnvRepo, RefRepo, VarRepo};
use rusqlite::{Connection, Transaction};

/// What a service is bound to
pub enum DbHandle<'c> {
    /// Plain connection; every call auto-commits
    Conn(&'c Connection),
    /// Open transaction owned by the service; rolled back when dropped
    Tx(Transaction<'c>),
}

impl DbHandle<'_> {
    fn conn(&self) -> &Connection {
        match self {
            DbHandle::Conn(conn) => conn,
            DbHandle::Tx(tx) => &**tx,
        }
    }
}

/// The storage-backed service
///
/// # Example
///
/// ```rust,ignore
/// let conn = envstash_store::db::open(path)?;
/// let service = EnvService::new(&conn);
/// service.with_tx(&ctx, &mut |ctx: &RequestContext, tx: &dyn Service| {
///     tx.env_create(ctx, EnvCreateArgs::new("dev", now))?;
///     tx.var_create(ctx, VarCreateArgs::new("dev", "PORT", "8080", now))?;
///     Ok(())
/// })?;
/// ```
pub struct EnvService<'c> {
    handle: DbHandle<'c>,
}

impl<'c> EnvService<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            handle: DbHandle::Conn(conn),
        }
    }

    pub fn is_transactional(&self) -> bool {
        matches!(self.handle, DbHandle::Tx(_))
    }

    /// Check the deadline, arm the interrupt, run `f`, tag errors
    fn run<T>(
        &self,
        ctx: &RequestContext,
        op: &'static str,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        let conn = self.handle.conn();
        if ctx.is_expired() {
            return Err(ExError::new(ExErrorKind::Timeout)
                .with_op(op)
                .with_request_id(ctx.request_id.clone())
                .with_message("deadline exceeded before database access"));
        }
        db::set_deadline(conn, ctx.deadline());
        f(conn).map_err(|e| {
            let e = if e.op().is_none() { e.with_op(op) } else { e };
            e.with_request_id(ctx.request_id.clone())
        })
    }

    fn tx_failure(ctx: &RequestContext, op: &str, err: rusqlite::Error) -> ExError {
        let cause = from_rusqlite(err);
        ExError::new(ExErrorKind::TransactionFailure)
            .with_op(op)
            .with_request_id(ctx.request_id.clone())
            .with_message(format!("could not {} transaction", op))
            .with_source(cause)
    }

    /// Error to report once a failed body has been rolled back
    ///
    /// The body's error wins unless the rollback itself failed; then it
    /// becomes the source of a `TransactionFailure`.
    fn after_rollback(
        ctx: &RequestContext,
        err: ExError,
        rollback: rusqlite::Result<()>,
    ) -> Result<()> {
        match rollback {
            Ok(()) => Err(err),
            Err(rollback_err) => {
                tracing::error!(
                    request_id = ctx.request_id.as_str(),
                    "rollback failed after transaction body error"
                );
                Err(ExError::new(ExErrorKind::TransactionFailure)
                    .with_op("rollback")
                    .with_request_id(ctx.request_id.clone())
                    .with_message(format!("rollback failed: {}", rollback_err))
                    .with_source(err))
            }
        }
    }
}

impl Service for EnvService<'_> {
    fn with_tx(&self, ctx: &RequestContext, f: &mut TxBody<'_>) -> Result<()> {
        let conn = match &self.handle {
            DbHandle::Conn(conn) => *conn,
            DbHandle::Tx(_) => {
                return Err(ExError::new(ExErrorKind::NestedTransaction)
                    .with_op("with_tx")
                    .with_request_id(ctx.request_id.clone())
                    .with_message("service is already bound to a transaction"));
            }
        };
        if ctx.is_expired() {
            return Err(ExError::new(ExErrorKind::Timeout)
                .with_op("with_tx")
                .with_request_id(ctx.request_id.clone())
                .with_message("deadline exceeded before transaction start"));
        }
        db::set_deadline(conn, ctx.deadline());

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Self::tx_failure(ctx, "begin", e))?;
        let bound = EnvService {
            handle: DbHandle::Tx(tx),
        };

        // A panic in `f` unwinds through `bound`; dropping the transaction
        // rolls it back.
        let outcome = f(ctx, &bound);

        let DbHandle::Tx(tx) = bound.handle else {
            return Err(ExError::new(ExErrorKind::Internal).with_op("with_tx"));
        };
        match outcome {
            Ok(()) => tx.commit().map_err(|e| Self::tx_failure(ctx, "commit", e)),
            Err(err) => Self::after_rollback(ctx, err, tx.rollback()),
        }
    }

    fn env_create(&self, ctx: &RequestContext, args: EnvCreateArgs) -> Result<Environment> {
        self.run(ctx, "env_create", |conn| {
            validate_name("environment", &args.name)?;
            EnvRepo::create(conn, &args)
        })
    }

    fn env_delete(&self, ctx: &RequestContext, name: &str) -> Result<()> {
        self.run(ctx, "env_delete", |conn| {
            if EnvRepo::delete(conn, name)? == 0 {
                return Err(EnvStashError::EnvironmentNotFound {
                    name: name.to_string(),
                }
                .into());
            }
            Ok(())
        })
    }

    fn env_list(
        &self,
        ctx: &RequestContext,
        filter: Option<&dyn Fn(&Environment) -> bool>,
    ) -> Result<Vec<Environment>> {
        self.run(ctx, "env_list", |conn| {
            let mut envs = EnvRepo::list(conn)?;
            if let Some(keep) = filter {
                envs.retain(|e| keep(e));
            }
            Ok(envs)
        })
    }

    fn env_show(&self, ctx: &RequestContext, name: &str) -> Result<Environment> {
        self.run(ctx, "env_show", |conn| EnvRepo::show(conn, name))
    }

    fn env_update(
        &self,
        ctx: &RequestContext,
        name: &str,
        args: EnvUpdateArgs,
    ) -> Result<Environment> {
        self.run(ctx, "env_update", |conn| {
            if let Some(new_name) = args.name.as_set() {
                validate_name("environment", new_name)?;
            }
            let name = EnvRepo::update(conn, name, args)?;
            EnvRepo::show(conn, &name)
        })
    }

    fn env_exportable_list(
        &self,
        ctx: &RequestContext,
        env_name: &str,
    ) -> Result<Vec<Exportable>> {
        self.run(ctx, "env_exportable_list", |conn| {
            let env = EnvRepo::show(conn, env_name)?;
            let vars = VarRepo::list(conn, env_name)?;
            let (refs, resolved) = list_resolved(conn, env_name)?;
            Ok(project_environment(&env, &vars, &refs, &resolved))
        })
    }

    fn var_create(&self, ctx: &RequestContext, args: VarCreateArgs) -> Result<Variable> {
        self.run(ctx, "var_create", |conn| {
            validate_name("variable", &args.name)?;
            VarRepo::create(conn, &args)
        })
    }

    fn var_delete(&self, ctx: &RequestContext, env_name: &str, name: &str) -> Result<()> {
        self.run(ctx, "var_delete", |conn| {
            if VarRepo::delete(conn, env_name, name)? == 0 {
                return Err(EnvStashError::VariableNotFound {
                    env_name: env_name.to_string(),
                    name: name.to_string(),
                }
                .into());
            }
            Ok(())
        })
    }

    fn var_list(&self, ctx: &RequestContext, env_name: &str) -> Result<Vec<Variable>> {
        self.run(ctx, "var_list", |conn| VarRepo::list(conn, env_name))
    }

    fn var_show(
        &self,
        ctx: &RequestContext,
        env_name: &str,
        name: &str,
    ) -> Result<(Variable, Vec<Reference>)> {
        self.run(ctx, "var_show", |conn| {
            let id = VarRepo::find_id(conn, env_name, name)?;
            let var = VarRepo::find_by_id(conn, id)?;
            let refs = RefRepo::list_by_target(conn, id)?;
            Ok((var, refs))
        })
    }

    fn var_update(
        &self,
        ctx: &RequestContext,
        env_name: &str,
        name: &str,
        args: VarUpdateArgs,
    ) -> Result<Variable> {
        self.run(ctx, "var_update", |conn| {
            if let Some(new_name) = args.name.as_set() {
                validate_name("variable", new_name)?;
            }
            let (env_name, name) = VarRepo::update(conn, env_name, name, args)?;
            VarRepo::show(conn, &env_name, &name)
        })
    }

    fn ref_create(&self, ctx: &RequestContext, args: RefCreateArgs) -> Result<Reference> {
        self.run(ctx, "ref_create", |conn| {
            validate_name("reference", &args.name)?;
            RefRepo::create(conn, &args)
        })
    }

    fn ref_delete(&self, ctx: &RequestContext, env_name: &str, name: &str) -> Result<()> {
        self.run(ctx, "ref_delete", |conn| {
            if RefRepo::delete(conn, env_name, name)? == 0 {
                return Err(EnvStashError::ReferenceNotFound {
                    env_name: env_name.to_string(),
                    name: name.to_string(),
                }
                .into());
            }
            Ok(())
        })
    }

    fn ref_list(
        &self,
        ctx: &RequestContext,
        env_name: &str,
    ) -> Result<(Vec<Reference>, Vec<Variable>)> {
        self.run(ctx, "ref_list", |conn| list_resolved(conn, env_name))
    }

    fn ref_show(
        &self,
        ctx: &RequestContext,
        env_name: &str,
        name: &str,
    ) -> Result<(Reference, Variable)> {
        self.run(ctx, "ref_show", |conn| resolve_target(conn, env_name, name))
    }

    fn ref_update(
        &self,
        ctx: &RequestContext,
        env_name: &str,
        name: &str,
        args: RefUpdateArgs,
    ) -> Result<Reference> {
        self.run(ctx, "ref_update", |conn| {
            if let Some(new_name) = args.name.as_set() {
                validate_name("reference", new_name)?;
            }
            let (env_name, name) = RefRepo::update(conn, env_name, name, args)?;
            Ok(RefRepo::show(conn, &env_name, &name)?.0)
        })
    }
}
