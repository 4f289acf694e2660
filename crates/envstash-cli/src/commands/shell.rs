//! `envstash shell zsh ...`

use std::io::Write;

use clap::{ArgAction, Args, Subcommand};
use envstash_core::diff::script::{
    render_chdir_script, render_export_script, render_unexport_script, render_zsh_init,
};
use envstash_core::diff::{chdir_inputs, compute_export_changes, lookup_process_env};
use envstash_core::{ExError, ExErrorKind, Exportable, Service};
use envstash_core_types::RequestContext;

use super::common::env_name_or_cwd;
use super::{with_service, GlobalArgs};

#[derive(Debug, Args)]
pub struct ShellArgs {
    #[command(subcommand)]
    pub shell: Shell,
}

#[derive(Debug, Subcommand)]
pub enum Shell {
    /// zsh integration
    Zsh(ZshArgs),
}

#[derive(Debug, Args)]
pub struct ZshArgs {
    #[command(subcommand)]
    pub command: ZshCommand,
}

#[derive(Debug, Subcommand)]
pub enum ZshCommand {
    /// Print the zsh initialization script
    Init(InitCmd),
    /// Print a script exporting an environment
    Export(ExportCmd),
    /// Print a script unsetting an environment's variables
    Unexport(ExportCmd),
    /// Print a script switching from one directory's environment to another's
    Chdir(ChdirCmd),
}

#[derive(Debug, Args)]
pub struct InitCmd {
    /// Include the `autoload -Uz add-zsh-hook` line
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub print_autoload: bool,
}

#[derive(Debug, Args)]
pub struct ExportCmd {
    /// Environment name (default: current directory)
    #[arg(long)]
    pub env: Option<String>,

    /// Print nothing instead of failing when the environment does not exist
    #[arg(long)]
    pub no_env_no_problem: bool,
}

#[derive(Debug, Args)]
pub struct ChdirCmd {
    /// Directory being left
    #[arg(long)]
    pub old: String,

    /// Directory being entered
    #[arg(long)]
    pub new: String,
}

pub fn execute(global: &GlobalArgs, args: ShellArgs) -> anyhow::Result<i32> {
    let Shell::Zsh(zsh) = args.shell;
    let script = match zsh.command {
        ZshCommand::Init(cmd) => render_zsh_init(cmd.print_autoload),
        ZshCommand::Export(cmd) => export_script(global, cmd, render_export_script)?,
        ZshCommand::Unexport(cmd) => export_script(global, cmd, render_unexport_script)?,
        ZshCommand::Chdir(cmd) => chdir_script(global, cmd)?,
    };
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(script.as_bytes())?;
    stdout.flush()?;
    Ok(0)
}

/// Exportables of `env_name`, or none when it does not exist
fn exportables_or_empty(
    svc: &dyn Service,
    ctx: &RequestContext,
    env_name: &str,
) -> Result<Vec<Exportable>, ExError> {
    match svc.env_exportable_list(ctx, env_name) {
        Err(e) if e.kind() == ExErrorKind::EnvironmentNotFound => Ok(Vec::new()),
        other => other,
    }
}

fn export_script(
    global: &GlobalArgs,
    cmd: ExportCmd,
    render: fn(&[Exportable]) -> String,
) -> anyhow::Result<String> {
    let env_name = env_name_or_cwd(cmd.env)?;
    let exportables = with_service(global, |svc, ctx| {
        if cmd.no_env_no_problem {
            Ok(exportables_or_empty(svc, ctx, &env_name)?)
        } else {
            Ok(svc.env_exportable_list(ctx, &env_name)?)
        }
    })?;
    Ok(render(&exportables))
}

fn chdir_script(global: &GlobalArgs, cmd: ChdirCmd) -> anyhow::Result<String> {
    let (old, new) = with_service(global, |svc, ctx| {
        let new = exportables_or_empty(svc, ctx, &cmd.new)?;
        let old = exportables_or_empty(svc, ctx, &cmd.old)?;
        Ok((old, new))
    })?;

    let (old_map, new_map) = chdir_inputs(&old, &new);
    let changes = compute_export_changes(&old_map, &new_map, lookup_process_env);
    Ok(render_chdir_script(&changes))
}
