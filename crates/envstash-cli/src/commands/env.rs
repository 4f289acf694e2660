//! `envstash env ...`

use clap::{ArgAction, Args, Subcommand};
use envstash_core::model::{EnvCreateArgs, EnvUpdateArgs};
use envstash_core::{with_tx_returning, Environment, Service};
use envstash_core_types::RequestContext;

use super::common::{env_name_or_cwd, ConfirmFlag, CreateFlags, UpdateFlags};
use super::{with_service, GlobalArgs};
use crate::output::{self, PrintOptions, Timezone};

#[derive(Debug, Args)]
pub struct EnvArgs {
    #[command(subcommand)]
    pub command: EnvCommand,
}

#[derive(Debug, Subcommand)]
pub enum EnvCommand {
    /// Create an environment
    Create(CreateCmd),
    /// Delete an environment and its variables and references
    Delete(DeleteCmd),
    /// List environments
    List(ListCmd),
    /// Print environment details
    Show(ShowCmd),
    /// Update an environment
    Update(UpdateCmd),
}

#[derive(Debug, Args)]
pub struct CreateCmd {
    /// Environment name (default: current directory)
    #[arg(long)]
    pub name: Option<String>,

    #[command(flatten)]
    pub common: CreateFlags,
}

#[derive(Debug, Args)]
pub struct DeleteCmd {
    #[arg(long)]
    pub name: Option<String>,

    #[command(flatten)]
    pub confirm: ConfirmFlag,
}

#[derive(Debug, Args)]
pub struct ListCmd {
    /// Only list environments with this enabled state
    #[arg(long, action = ArgAction::Set)]
    pub enabled: Option<bool>,

    /// Only list environments whose name starts with this prefix
    #[arg(long)]
    pub name_prefix: Option<String>,

    #[arg(long, value_enum, default_value = "local")]
    pub timezone: Timezone,
}

#[derive(Debug, Args)]
pub struct ShowCmd {
    #[arg(long)]
    pub name: Option<String>,

    /// Mask values when printing
    #[arg(long, env = "ENVSTASH_MASK", default_value_t = true, action = ArgAction::Set)]
    pub mask: bool,

    #[arg(long, value_enum, default_value = "local")]
    pub timezone: Timezone,
}

#[derive(Debug, Args)]
pub struct UpdateCmd {
    #[arg(long)]
    pub name: Option<String>,

    #[command(flatten)]
    pub common: UpdateFlags,

    #[command(flatten)]
    pub confirm: ConfirmFlag,
}

pub fn execute(global: &GlobalArgs, args: EnvArgs) -> anyhow::Result<i32> {
    match args.command {
        EnvCommand::Create(cmd) => create(global, cmd),
        EnvCommand::Delete(cmd) => delete(global, cmd),
        EnvCommand::List(cmd) => list(global, cmd),
        EnvCommand::Show(cmd) => show(global, cmd),
        EnvCommand::Update(cmd) => update(global, cmd),
    }?;
    Ok(0)
}

fn create(global: &GlobalArgs, cmd: CreateCmd) -> anyhow::Result<()> {
    let name = env_name_or_cwd(cmd.name)?;
    let (create_time, update_time) = cmd.common.times();
    let args = EnvCreateArgs {
        name,
        comment: cmd.common.comment.clone(),
        create_time,
        update_time,
        enabled: cmd.common.enabled,
    };

    let env = with_service(global, |svc, ctx| {
        let env = with_tx_returning(svc, ctx, |ctx: &RequestContext, tx: &dyn Service| {
            tx.env_create(ctx, args.clone())
        })?;
        Ok(env)
    })?;
    println!("Created env: {}", env.name);
    Ok(())
}

fn delete(global: &GlobalArgs, cmd: DeleteCmd) -> anyhow::Result<()> {
    let name = env_name_or_cwd(cmd.name)?;
    cmd.confirm.check()?;

    with_service(global, |svc, ctx| {
        svc.with_tx(ctx, &mut |ctx: &RequestContext, tx: &dyn Service| {
            tx.env_delete(ctx, &name)
        })?;
        Ok(())
    })?;
    println!("deleted: {}", name);
    Ok(())
}

fn list(global: &GlobalArgs, cmd: ListCmd) -> anyhow::Result<()> {
    let filter: &dyn Fn(&Environment) -> bool = &|e: &Environment| {
        cmd.enabled.map_or(true, |enabled| e.enabled == enabled)
            && cmd
                .name_prefix
                .as_deref()
                .map_or(true, |prefix| e.name.starts_with(prefix))
    };

    let envs = with_service(global, |svc, ctx| Ok(svc.env_list(ctx, Some(filter))?))?;

    let opts = PrintOptions {
        mask: false,
        tz: cmd.timezone,
    };
    output::print_env_list(&mut std::io::stdout().lock(), opts, &envs)?;
    Ok(())
}

fn show(global: &GlobalArgs, cmd: ShowCmd) -> anyhow::Result<()> {
    let name = env_name_or_cwd(cmd.name)?;

    let (env, vars, (refs, targets)) = with_service(global, |svc, ctx| {
        let shown = with_tx_returning(svc, ctx, |ctx: &RequestContext, tx: &dyn Service| {
            let env = tx.env_show(ctx, &name)?;
            let vars = tx.var_list(ctx, &name)?;
            let refs = tx.ref_list(ctx, &name)?;
            Ok((env, vars, refs))
        })?;
        Ok(shown)
    })?;

    let opts = PrintOptions {
        mask: cmd.mask,
        tz: cmd.timezone,
    };
    output::print_env_show(
        &mut std::io::stdout().lock(),
        opts,
        &env,
        &vars,
        &refs,
        &targets,
    )?;
    Ok(())
}

fn update(global: &GlobalArgs, cmd: UpdateCmd) -> anyhow::Result<()> {
    let name = env_name_or_cwd(cmd.name)?;
    cmd.confirm.check()?;

    let args = EnvUpdateArgs {
        name: cmd.common.new_name(),
        comment: cmd.common.comment(),
        create_time: cmd.common.create_time(),
        update_time: cmd.common.update_time(),
        enabled: cmd.common.enabled(),
    };

    let env = with_service(global, |svc, ctx| {
        let env = with_tx_returning(svc, ctx, |ctx: &RequestContext, tx: &dyn Service| {
            tx.env_update(ctx, &name, args.clone())
        })?;
        Ok(env)
    })?;
    println!("updated env: {}", env.name);
    Ok(())
}
