//! Operation tracing decorator
//!
//! [`TracedService`] wraps any [`Service`] and brackets every call with the
//! canonical start and end (or end_error) events. Entity keys are logged;
//! variable values never are.

use std::time::Instant;

use envstash_core::model::{
    EnvCreateArgs, EnvUpdateArgs, Environment, Exportable, RefCreateArgs, RefUpdateArgs,
    Reference, VarCreateArgs, VarUpdateArgs, Variable,
};
use envstash_core::ops::service::TxBody;
use envstash_core::{log_op_end, log_op_error, log_op_start, Result, Service};
use envstash_core_types::RequestContext;

/// Where traced events are attributed and whether they are emitted at all
#[derive(Debug, Clone)]
pub struct Observer {
    component: String,
    enabled: bool,
}

impl Observer {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            enabled: true,
        }
    }

    /// An observer that emits nothing
    pub fn disabled() -> Self {
        Self {
            component: String::new(),
            enabled: false,
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Entity keys attached to an operation's events
#[derive(Default, Clone, Copy)]
struct Keys<'a> {
    env_name: Option<&'a str>,
    var_name: Option<&'a str>,
    ref_name: Option<&'a str>,
}

impl<'a> Keys<'a> {
    fn env(env_name: &'a str) -> Self {
        Self {
            env_name: Some(env_name),
            ..Self::default()
        }
    }

    fn var(env_name: &'a str, var_name: &'a str) -> Self {
        Self {
            env_name: Some(env_name),
            var_name: Some(var_name),
            ..Self::default()
        }
    }

    fn reference(env_name: &'a str, ref_name: &'a str) -> Self {
        Self {
            env_name: Some(env_name),
            ref_name: Some(ref_name),
            ..Self::default()
        }
    }
}

/// Logging decorator over a [`Service`]
///
/// Transaction bodies receive a traced view of the transaction-bound
/// service, so calls made inside `with_tx` are logged as well.
pub struct TracedService<S> {
    inner: S,
    observer: Observer,
}

impl<S: Service> TracedService<S> {
    pub fn new(inner: S, observer: Observer) -> Self {
        Self { inner, observer }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn observe<T>(
        &self,
        ctx: &RequestContext,
        op: &'static str,
        keys: Keys<'_>,
        f: impl FnOnce(&S) -> Result<T>,
    ) -> Result<T> {
        if !self.observer.is_enabled() {
            return f(&self.inner);
        }

        let span = tracing::info_span!(
            "envstash_op",
            op,
            request_id = ctx.request_id.as_str(),
            component = self.observer.component(),
        );
        let _guard = span.enter();

        log_op_start!(
            op,
            request_id = ctx.request_id.as_str(),
            env_name = keys.env_name,
            var_name = keys.var_name,
            ref_name = keys.ref_name,
        );
        let start = Instant::now();
        let result = f(&self.inner);
        let elapsed = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => log_op_end!(
                op,
                duration_ms = elapsed,
                request_id = ctx.request_id.as_str(),
                env_name = keys.env_name,
                var_name = keys.var_name,
                ref_name = keys.ref_name,
            ),
            Err(e) => log_op_error!(
                op,
                e.clone(),
                duration_ms = elapsed,
                request_id = ctx.request_id.as_str(),
                env_name = keys.env_name,
                var_name = keys.var_name,
                ref_name = keys.ref_name,
            ),
        }
        result
    }
}

impl<S: Service> Service for TracedService<S> {
    fn with_tx(&self, ctx: &RequestContext, f: &mut TxBody<'_>) -> Result<()> {
        let observer = self.observer.clone();
        self.observe(ctx, "with_tx", Keys::default(), |inner| {
            inner.with_tx(ctx, &mut |ctx: &RequestContext, tx: &dyn Service| {
                let traced = TracedService::new(tx, observer.clone());
                f(ctx, &traced)
            })
        })
    }

    fn env_create(&self, ctx: &RequestContext, args: EnvCreateArgs) -> Result<Environment> {
        let name = args.name.clone();
        self.observe(ctx, "env_create", Keys::env(&name), |s| {
            s.env_create(ctx, args)
        })
    }

    fn env_delete(&self, ctx: &RequestContext, name: &str) -> Result<()> {
        self.observe(ctx, "env_delete", Keys::env(name), |s| s.env_delete(ctx, name))
    }

    fn env_list(
        &self,
        ctx: &RequestContext,
        filter: Option<&dyn Fn(&Environment) -> bool>,
    ) -> Result<Vec<Environment>> {
        self.observe(ctx, "env_list", Keys::default(), |s| s.env_list(ctx, filter))
    }

    fn env_show(&self, ctx: &RequestContext, name: &str) -> Result<Environment> {
        self.observe(ctx, "env_show", Keys::env(name), |s| s.env_show(ctx, name))
    }

    fn env_update(
        &self,
        ctx: &RequestContext,
        name: &str,
        args: EnvUpdateArgs,
    ) -> Result<Environment> {
        self.observe(ctx, "env_update", Keys::env(name), |s| {
            s.env_update(ctx, name, args)
        })
    }

    fn env_exportable_list(
        &self,
        ctx: &RequestContext,
        env_name: &str,
    ) -> Result<Vec<Exportable>> {
        self.observe(ctx, "env_exportable_list", Keys::env(env_name), |s| {
            s.env_exportable_list(ctx, env_name)
        })
    }

    fn var_create(&self, ctx: &RequestContext, args: VarCreateArgs) -> Result<Variable> {
        let (env_name, name) = (args.env_name.clone(), args.name.clone());
        self.observe(ctx, "var_create", Keys::var(&env_name, &name), |s| {
            s.var_create(ctx, args)
        })
    }

    fn var_delete(&self, ctx: &RequestContext, env_name: &str, name: &str) -> Result<()> {
        self.observe(ctx, "var_delete", Keys::var(env_name, name), |s| {
            s.var_delete(ctx, env_name, name)
        })
    }

    fn var_list(&self, ctx: &RequestContext, env_name: &str) -> Result<Vec<Variable>> {
        self.observe(ctx, "var_list", Keys::env(env_name), |s| {
            s.var_list(ctx, env_name)
        })
    }

    fn var_show(
        &self,
        ctx: &RequestContext,
        env_name: &str,
        name: &str,
    ) -> Result<(Variable, Vec<Reference>)> {
        self.observe(ctx, "var_show", Keys::var(env_name, name), |s| {
            s.var_show(ctx, env_name, name)
        })
    }

    fn var_update(
        &self,
        ctx: &RequestContext,
        env_name: &str,
        name: &str,
        args: VarUpdateArgs,
    ) -> Result<Variable> {
        self.observe(ctx, "var_update", Keys::var(env_name, name), |s| {
            s.var_update(ctx, env_name, name, args)
        })
    }

    fn ref_create(&self, ctx: &RequestContext, args: RefCreateArgs) -> Result<Reference> {
        let (env_name, name) = (args.env_name.clone(), args.name.clone());
        self.observe(ctx, "ref_create", Keys::reference(&env_name, &name), |s| {
            s.ref_create(ctx, args)
        })
    }

    fn ref_delete(&self, ctx: &RequestContext, env_name: &str, name: &str) -> Result<()> {
        self.observe(ctx, "ref_delete", Keys::reference(env_name, name), |s| {
            s.ref_delete(ctx, env_name, name)
        })
    }

    fn ref_list(
        &self,
        ctx: &RequestContext,
        env_name: &str,
    ) -> Result<(Vec<Reference>, Vec<Variable>)> {
        self.observe(ctx, "ref_list", Keys::env(env_name), |s| {
            s.ref_list(ctx, env_name)
        })
    }

    fn ref_show(
        &self,
        ctx: &RequestContext,
        env_name: &str,
        name: &str,
    ) -> Result<(Reference, Variable)> {
        self.observe(ctx, "ref_show", Keys::reference(env_name, name), |s| {
            s.ref_show(ctx, env_name, name)
        })
    }

    fn ref_update(
        &self,
        ctx: &RequestContext,
        env_name: &str,
        name: &str,
        args: RefUpdateArgs,
    ) -> Result<Reference> {
        self.observe(ctx, "ref_update", Keys::reference(env_name, name), |s| {
            s.ref_update(ctx, env_name, name, args)
        })
    }
}
