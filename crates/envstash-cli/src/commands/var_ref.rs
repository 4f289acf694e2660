//! `envstash var ref ...`

use clap::{ArgAction, Args, Subcommand};
use envstash_core::model::{RefCreateArgs, RefUpdateArgs};
use envstash_core::{with_tx_returning, Patch, Service};
use envstash_core_types::RequestContext;

use super::common::{env_name_or_cwd, ConfirmFlag, CreateFlags, UpdateFlags};
use super::{with_service, GlobalArgs};
use crate::output::{self, Format, PrintOptions, Timezone};

#[derive(Debug, Args)]
pub struct RefArgs {
    #[command(subcommand)]
    pub command: RefCommand,
}

#[derive(Debug, Subcommand)]
pub enum RefCommand {
    /// Create a reference in this env to a variable in another env
    Create(CreateCmd),
    /// Delete a reference
    Delete(DeleteCmd),
    /// Show a reference and the variable it resolves to
    Show(ShowCmd),
    /// Update a reference
    Update(UpdateCmd),
}

#[derive(Debug, Args)]
pub struct CreateCmd {
    /// Environment holding the reference (default: current directory)
    #[arg(long)]
    pub env: Option<String>,

    #[arg(long)]
    pub name: String,

    /// Environment of the referenced variable
    #[arg(long)]
    pub ref_env: String,

    /// Name of the referenced variable
    #[arg(long)]
    pub ref_var: String,

    #[command(flatten)]
    pub common: CreateFlags,
}

#[derive(Debug, Args)]
pub struct DeleteCmd {
    #[arg(long)]
    pub env: Option<String>,

    #[arg(long)]
    pub name: String,

    #[command(flatten)]
    pub confirm: ConfirmFlag,
}

#[derive(Debug, Args)]
pub struct ShowCmd {
    #[arg(long)]
    pub env: Option<String>,

    #[arg(long)]
    pub name: String,

    #[arg(long, env = "ENVSTASH_MASK", default_value_t = true, action = ArgAction::Set)]
    pub mask: bool,

    #[arg(long, value_enum, default_value = "table")]
    pub format: Format,

    #[arg(long, value_enum, default_value = "local")]
    pub timezone: Timezone,
}

#[derive(Debug, Args)]
pub struct UpdateCmd {
    #[arg(long)]
    pub env: Option<String>,

    #[arg(long)]
    pub name: String,

    /// Move the reference to this environment
    #[arg(long)]
    pub new_env: Option<String>,

    /// New target environment; requires --ref-var
    #[arg(long)]
    pub ref_env: Option<String>,

    /// New target variable; requires --ref-env
    #[arg(long)]
    pub ref_var: Option<String>,

    #[command(flatten)]
    pub common: UpdateFlags,

    #[command(flatten)]
    pub confirm: ConfirmFlag,
}

pub fn execute(global: &GlobalArgs, args: RefArgs) -> anyhow::Result<()> {
    match args.command {
        RefCommand::Create(cmd) => create(global, cmd),
        RefCommand::Delete(cmd) => delete(global, cmd),
        RefCommand::Show(cmd) => show(global, cmd),
        RefCommand::Update(cmd) => update(global, cmd),
    }
}

fn create(global: &GlobalArgs, cmd: CreateCmd) -> anyhow::Result<()> {
    let env_name = env_name_or_cwd(cmd.env)?;
    let (create_time, update_time) = cmd.common.times();
    let args = RefCreateArgs {
        env_name: env_name.clone(),
        name: cmd.name.clone(),
        comment: cmd.common.comment.clone(),
        create_time,
        update_time,
        ref_env_name: cmd.ref_env,
        ref_var_name: cmd.ref_var,
        enabled: cmd.common.enabled,
    };

    with_service(global, |svc, ctx| {
        with_tx_returning(svc, ctx, |ctx: &RequestContext, tx: &dyn Service| {
            tx.ref_create(ctx, args.clone())
        })?;
        Ok(())
    })?;
    println!("Created env ref: {}: {}", env_name, cmd.name);
    Ok(())
}

fn delete(global: &GlobalArgs, cmd: DeleteCmd) -> anyhow::Result<()> {
    let env_name = env_name_or_cwd(cmd.env)?;
    cmd.confirm.check()?;

    with_service(global, |svc, ctx| {
        svc.with_tx(ctx, &mut |ctx: &RequestContext, tx: &dyn Service| {
            tx.ref_delete(ctx, &env_name, &cmd.name)
        })?;
        Ok(())
    })?;
    println!("Deleted {}: {}", env_name, cmd.name);
    Ok(())
}

fn show(global: &GlobalArgs, cmd: ShowCmd) -> anyhow::Result<()> {
    let env_name = env_name_or_cwd(cmd.env)?;

    let (reference, target) = with_service(global, |svc, ctx| {
        Ok(svc.ref_show(ctx, &env_name, &cmd.name)?)
    })?;

    let opts = PrintOptions {
        mask: cmd.mask,
        tz: cmd.timezone,
    };
    output::print_ref_show(
        &mut std::io::stdout().lock(),
        opts,
        cmd.format,
        &reference,
        &target,
    )?;
    Ok(())
}

fn update(global: &GlobalArgs, cmd: UpdateCmd) -> anyhow::Result<()> {
    let env_name = env_name_or_cwd(cmd.env)?;
    cmd.confirm.check()?;

    let args = RefUpdateArgs {
        env_name: Patch::from_option(cmd.new_env.clone()),
        name: cmd.common.new_name(),
        comment: cmd.common.comment(),
        create_time: cmd.common.create_time(),
        update_time: cmd.common.update_time(),
        ref_env_name: Patch::from_option(cmd.ref_env.clone()),
        ref_var_name: Patch::from_option(cmd.ref_var.clone()),
        enabled: cmd.common.enabled(),
    };

    let reference = with_service(global, |svc, ctx| {
        let reference = with_tx_returning(svc, ctx, |ctx: &RequestContext, tx: &dyn Service| {
            tx.ref_update(ctx, &env_name, &cmd.name, args.clone())
        })?;
        Ok(reference)
    })?;
    println!("Updated var ref {}:{}", reference.env_name, reference.name);
    Ok(())
}
