//! The CRUD surface shared by every service implementation
//!
//! The trait is object safe: transaction bodies receive a `&dyn Service`
//! bound to the open transaction, and decorators wrap any implementation.

use envstash_core_types::RequestContext;

use crate::errors::Result;
use crate::model::{
    EnvCreateArgs, EnvUpdateArgs, Environment, Exportable, RefCreateArgs, RefUpdateArgs,
    Reference, VarCreateArgs, VarUpdateArgs, Variable,
};

/// Body of a transaction: receives the context and a tx-bound service
pub type TxBody<'a> = dyn FnMut(&RequestContext, &dyn Service) -> Result<()> + 'a;

/// Environment, variable and reference operations
///
/// Outside [`Service::with_tx`] every call auto-commits on its own. Inside,
/// all calls made through the service handed to the body share one
/// transaction that commits only if the body returns `Ok`.
pub trait Service {
    /// Run `f` inside one transaction
    ///
    /// Errors with `NestedTransaction` when `self` is already bound to a
    /// transaction.
    fn with_tx(&self, ctx: &RequestContext, f: &mut TxBody<'_>) -> Result<()>;

    fn env_create(&self, ctx: &RequestContext, args: EnvCreateArgs) -> Result<Environment>;
    fn env_delete(&self, ctx: &RequestContext, name: &str) -> Result<()>;
    /// All environments ordered by name, optionally filtered by `filter`
    fn env_list(
        &self,
        ctx: &RequestContext,
        filter: Option<&dyn Fn(&Environment) -> bool>,
    ) -> Result<Vec<Environment>>;
    fn env_show(&self, ctx: &RequestContext, name: &str) -> Result<Environment>;
    fn env_update(
        &self,
        ctx: &RequestContext,
        name: &str,
        args: EnvUpdateArgs,
    ) -> Result<Environment>;
    /// The flattened export view of one environment, sorted by name
    fn env_exportable_list(&self, ctx: &RequestContext, env_name: &str)
        -> Result<Vec<Exportable>>;

    fn var_create(&self, ctx: &RequestContext, args: VarCreateArgs) -> Result<Variable>;
    fn var_delete(&self, ctx: &RequestContext, env_name: &str, name: &str) -> Result<()>;
    /// Variables owned by `env_name`, ordered by name
    fn var_list(&self, ctx: &RequestContext, env_name: &str) -> Result<Vec<Variable>>;
    /// The variable plus every reference that targets it
    fn var_show(
        &self,
        ctx: &RequestContext,
        env_name: &str,
        name: &str,
    ) -> Result<(Variable, Vec<Reference>)>;
    fn var_update(
        &self,
        ctx: &RequestContext,
        env_name: &str,
        name: &str,
        args: VarUpdateArgs,
    ) -> Result<Variable>;

    fn ref_create(&self, ctx: &RequestContext, args: RefCreateArgs) -> Result<Reference>;
    fn ref_delete(&self, ctx: &RequestContext, env_name: &str, name: &str) -> Result<()>;
    /// References owned by `env_name` and their targets, as parallel vectors
    fn ref_list(
        &self,
        ctx: &RequestContext,
        env_name: &str,
    ) -> Result<(Vec<Reference>, Vec<Variable>)>;
    fn ref_show(
        &self,
        ctx: &RequestContext,
        env_name: &str,
        name: &str,
    ) -> Result<(Reference, Variable)>;
    fn ref_update(
        &self,
        ctx: &RequestContext,
        env_name: &str,
        name: &str,
        args: RefUpdateArgs,
    ) -> Result<Reference>;
}

impl<S: Service + ?Sized> Service for &S {
    fn with_tx(&self, ctx: &RequestContext, f: &mut TxBody<'_>) -> Result<()> {
        (**self).with_tx(ctx, f)
    }

    fn env_create(&self, ctx: &RequestContext, args: EnvCreateArgs) -> Result<Environment> {
        (**self).env_create(ctx, args)
    }

    fn env_delete(&self, ctx: &RequestContext, name: &str) -> Result<()> {
        (**self).env_delete(ctx, name)
    }

    fn env_list(
        &self,
        ctx: &RequestContext,
        filter: Option<&dyn Fn(&Environment) -> bool>,
    ) -> Result<Vec<Environment>> {
        (**self).env_list(ctx, filter)
    }

    fn env_show(&self, ctx: &RequestContext, name: &str) -> Result<Environment> {
        (**self).env_show(ctx, name)
    }

    fn env_update(
        &self,
        ctx: &RequestContext,
        name: &str,
        args: EnvUpdateArgs,
    ) -> Result<Environment> {
        (**self).env_update(ctx, name, args)
    }

    fn env_exportable_list(
        &self,
        ctx: &RequestContext,
        env_name: &str,
    ) -> Result<Vec<Exportable>> {
        (**self).env_exportable_list(ctx, env_name)
    }

    fn var_create(&self, ctx: &RequestContext, args: VarCreateArgs) -> Result<Variable> {
        (**self).var_create(ctx, args)
    }

    fn var_delete(&self, ctx: &RequestContext, env_name: &str, name: &str) -> Result<()> {
        (**self).var_delete(ctx, env_name, name)
    }

    fn var_list(&self, ctx: &RequestContext, env_name: &str) -> Result<Vec<Variable>> {
        (**self).var_list(ctx, env_name)
    }

    fn var_show(
        &self,
        ctx: &RequestContext,
        env_name: &str,
        name: &str,
    ) -> Result<(Variable, Vec<Reference>)> {
        (**self).var_show(ctx, env_name, name)
    }

    fn var_update(
        &self,
        ctx: &RequestContext,
        env_name: &str,
        name: &str,
        args: VarUpdateArgs,
    ) -> Result<Variable> {
        (**self).var_update(ctx, env_name, name, args)
    }

    fn ref_create(&self, ctx: &RequestContext, args: RefCreateArgs) -> Result<Reference> {
        (**self).ref_create(ctx, args)
    }

    fn ref_delete(&self, ctx: &RequestContext, env_name: &str, name: &str) -> Result<()> {
        (**self).ref_delete(ctx, env_name, name)
    }

    fn ref_list(
        &self,
        ctx: &RequestContext,
        env_name: &str,
    ) -> Result<(Vec<Reference>, Vec<Variable>)> {
        (**self).ref_list(ctx, env_name)
    }

    fn ref_show(
        &self,
        ctx: &RequestContext,
        env_name: &str,
        name: &str,
    ) -> Result<(Reference, Variable)> {
        (**self).ref_show(ctx, env_name, name)
    }

    fn ref_update(
        &self,
        ctx: &RequestContext,
        env_name: &str,
        name: &str,
        args: RefUpdateArgs,
    ) -> Result<Reference> {
        (**self).ref_update(ctx, env_name, name, args)
    }
}

/// Run `f` in a transaction and hand back the value it produced
///
/// # Example
///
/// ```rust,ignore
/// let var = with_tx_returning(&svc, &ctx, |ctx, tx| {
///     tx.env_create(ctx, EnvCreateArgs::new("dev", now))?;
///     tx.var_create(ctx, VarCreateArgs::new("dev", "PORT", "8080", now))
/// })?;
/// ```
pub fn with_tx_returning<S, T, F>(service: &S, ctx: &RequestContext, mut f: F) -> Result<T>
where
    S: Service + ?Sized,
    F: FnMut(&RequestContext, &dyn Service) -> Result<T>,
{
    let mut slot: Option<T> = None;
    service.with_tx(ctx, &mut |ctx: &RequestContext, tx: &dyn Service| {
        slot = Some(f(ctx, tx)?);
        Ok(())
    })?;
    slot.ok_or_else(|| {
        crate::errors::ExError::new(crate::errors::ExErrorKind::Internal)
            .with_op("with_tx")
            .with_message("transaction body produced no value")
    })
}
