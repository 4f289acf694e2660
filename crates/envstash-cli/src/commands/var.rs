//! `envstash var ...`

use clap::{ArgAction, Args, Subcommand};
use envstash_core::model::{VarCreateArgs, VarUpdateArgs};
use envstash_core::{with_tx_returning, Patch, Service};
use envstash_core_types::{RequestContext, Sensitive};

use super::common::{env_name_or_cwd, prompt_line, ConfirmFlag, CreateFlags, UpdateFlags};
use super::{var_ref, with_service, GlobalArgs};
use crate::output::{self, Format, PrintOptions, Timezone};

#[derive(Debug, Args)]
pub struct VarArgs {
    #[command(subcommand)]
    pub command: VarCommand,
}

#[derive(Debug, Subcommand)]
pub enum VarCommand {
    /// Create a variable in an environment
    Create(CreateCmd),
    /// Delete a variable
    Delete(DeleteCmd),
    /// Show a variable and the references that point at it
    Show(ShowCmd),
    /// Update a variable
    Update(UpdateCmd),
    /// References to variables in other environments
    Ref(var_ref::RefArgs),
}

#[derive(Debug, Args)]
pub struct CreateCmd {
    /// Environment name (default: current directory)
    #[arg(long)]
    pub env: Option<String>,

    #[arg(long)]
    pub name: String,

    /// Value; read from stdin when omitted
    #[arg(long)]
    pub value: Option<String>,

    /// Comma-separated candidate values for shell completion
    #[arg(long, value_delimiter = ',')]
    pub completions: Vec<String>,

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

    /// Mask values when printing
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

    /// Move the variable to this environment
    #[arg(long)]
    pub new_env: Option<String>,

    #[arg(long)]
    pub value: Option<String>,

    /// Comma-separated candidate values; an empty string clears them
    #[arg(long)]
    pub completions: Option<String>,

    #[command(flatten)]
    pub common: UpdateFlags,

    #[command(flatten)]
    pub confirm: ConfirmFlag,
}

pub fn execute(global: &GlobalArgs, args: VarArgs) -> anyhow::Result<i32> {
    match args.command {
        VarCommand::Create(cmd) => create(global, cmd),
        VarCommand::Delete(cmd) => delete(global, cmd),
        VarCommand::Show(cmd) => show(global, cmd),
        VarCommand::Update(cmd) => update(global, cmd),
        VarCommand::Ref(args) => var_ref::execute(global, args),
    }?;
    Ok(0)
}

/// Split `a,b,,c` into `["a", "b", "c"]`
fn split_completions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn create(global: &GlobalArgs, cmd: CreateCmd) -> anyhow::Result<()> {
    let env_name = env_name_or_cwd(cmd.env)?;
    let value = match cmd.value {
        Some(value) => value,
        None => prompt_line("Enter value: ")?,
    };
    let (create_time, update_time) = cmd.common.times();
    let args = VarCreateArgs {
        env_name: env_name.clone(),
        name: cmd.name.clone(),
        comment: cmd.common.comment.clone(),
        create_time,
        update_time,
        value: Sensitive::new(value),
        enabled: cmd.common.enabled,
        completions: cmd.completions.into_iter().filter(|c| !c.is_empty()).collect(),
    };

    with_service(global, |svc, ctx| {
        with_tx_returning(svc, ctx, |ctx: &RequestContext, tx: &dyn Service| {
            tx.var_create(ctx, args.clone())
        })?;
        Ok(())
    })?;
    println!("Created env var: {}: {}", env_name, cmd.name);
    Ok(())
}

fn delete(global: &GlobalArgs, cmd: DeleteCmd) -> anyhow::Result<()> {
    let env_name = env_name_or_cwd(cmd.env)?;
    cmd.confirm.check()?;

    with_service(global, |svc, ctx| {
        svc.with_tx(ctx, &mut |ctx: &RequestContext, tx: &dyn Service| {
            tx.var_delete(ctx, &env_name, &cmd.name)
        })?;
        Ok(())
    })?;
    println!("Deleted {}: {}", env_name, cmd.name);
    Ok(())
}

fn show(global: &GlobalArgs, cmd: ShowCmd) -> anyhow::Result<()> {
    let env_name = env_name_or_cwd(cmd.env)?;

    let (var, refs) = with_service(global, |svc, ctx| {
        Ok(svc.var_show(ctx, &env_name, &cmd.name)?)
    })?;

    let opts = PrintOptions {
        mask: cmd.mask,
        tz: cmd.timezone,
    };
    output::print_var_show(&mut std::io::stdout().lock(), opts, cmd.format, &var, &refs)?;
    Ok(())
}

fn update(global: &GlobalArgs, cmd: UpdateCmd) -> anyhow::Result<()> {
    let env_name = env_name_or_cwd(cmd.env)?;
    cmd.confirm.check()?;

    let completions = match cmd.completions.as_deref() {
        None => Patch::Keep,
        Some("") => Patch::Clear,
        Some(raw) => Patch::Set(split_completions(raw)),
    };
    let args = VarUpdateArgs {
        env_name: Patch::from_option(cmd.new_env.clone()),
        name: cmd.common.new_name(),
        comment: cmd.common.comment(),
        create_time: cmd.common.create_time(),
        update_time: cmd.common.update_time(),
        value: Patch::from_option(cmd.value.clone().map(Sensitive::new)),
        enabled: cmd.common.enabled(),
        completions,
    };

    let var = with_service(global, |svc, ctx| {
        let var = with_tx_returning(svc, ctx, |ctx: &RequestContext, tx: &dyn Service| {
            tx.var_update(ctx, &env_name, &cmd.name, args.clone())
        })?;
        Ok(var)
    })?;
    println!("updated env var: {}: {}", var.env_name, var.name);
    Ok(())
}
