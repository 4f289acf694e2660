//! `envstash exec`

use std::process::Command;

use anyhow::{bail, Context};
use clap::{ArgAction, Args};
use envstash_core::Service;

use super::{with_service, GlobalArgs};

#[derive(Debug, Args)]
pub struct ExecArgs {
    /// Environments to apply, in order; later ones override earlier ones
    #[arg(long = "env")]
    pub envs: Vec<String>,

    /// Extra NAME=VALUE assignments applied after every environment
    #[arg(long = "set", value_parser = parse_assignment)]
    pub assignments: Vec<(String, String)>,

    /// Start from the current process environment
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub inherit_env: bool,

    /// Command and its arguments
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got {:?}", s)),
    }
}

/// Name/value pairs to set, in application order
fn collect_vars(
    svc: &dyn Service,
    ctx: &envstash_core_types::RequestContext,
    envs: &[String],
) -> envstash_core::Result<Vec<(String, String)>> {
    let mut vars = Vec::new();
    for env_name in envs {
        for e in svc.env_exportable_list(ctx, env_name)? {
            if e.enabled {
                vars.push((e.name, e.value.into_inner()));
            }
        }
    }
    Ok(vars)
}

pub fn execute(global: &GlobalArgs, args: ExecArgs) -> anyhow::Result<i32> {
    let Some((program, program_args)) = args.command.split_first() else {
        bail!("no command provided to exec");
    };

    let vars = if args.envs.is_empty() {
        Vec::new()
    } else {
        with_service(global, |svc, ctx| Ok(collect_vars(svc, ctx, &args.envs)?))?
    };

    let mut command = Command::new(program);
    command.args(program_args);
    if !args.inherit_env {
        command.env_clear();
    }
    command.envs(vars);
    command.envs(args.assignments.iter().map(|(k, v)| (k, v)));

    tracing::debug!(program = program.as_str(), "exec");
    let status = command
        .status()
        .with_context(|| format!("could not run {}", program))?;
    Ok(status.code().unwrap_or(1))
}
