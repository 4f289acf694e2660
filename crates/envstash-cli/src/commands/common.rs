//! Flags shared by several subcommands

use std::io::{BufRead, Write};

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{ArgAction, Args};
use envstash_core::timestamp::{now, string_to_time};
use envstash_core::Patch;

/// Sentinel accepted by `--update-time` to leave the stored time alone
pub const UNSET: &str = "UNSET";

pub fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    string_to_time(s).map_err(|e| e.message().to_string())
}

/// Value of `--update-time` on update commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateTime {
    Unset,
    At(DateTime<Utc>),
}

fn parse_update_time(s: &str) -> Result<UpdateTime, String> {
    if s == UNSET {
        return Ok(UpdateTime::Unset);
    }
    parse_time(s).map(UpdateTime::At)
}

/// `--comment`, `--create-time`, `--update-time` and `--enabled` on create
#[derive(Debug, Args)]
pub struct CreateFlags {
    #[arg(long, default_value = "")]
    pub comment: String,

    /// RFC3339 timestamp (default: now)
    #[arg(long, value_parser = parse_time)]
    pub create_time: Option<DateTime<Utc>>,

    /// RFC3339 timestamp (default: now)
    #[arg(long, value_parser = parse_time)]
    pub update_time: Option<DateTime<Utc>>,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub enabled: bool,
}

impl CreateFlags {
    /// `(create_time, update_time)` with defaults filled in
    pub fn times(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let now = now();
        (
            self.create_time.unwrap_or(now),
            self.update_time.unwrap_or(now),
        )
    }
}

/// Flags every update command accepts
#[derive(Debug, Args)]
pub struct UpdateFlags {
    #[arg(long)]
    pub comment: Option<String>,

    #[arg(long, value_parser = parse_time)]
    pub create_time: Option<DateTime<Utc>>,

    /// RFC3339 timestamp, or UNSET to keep the stored one (default: now)
    #[arg(long, value_parser = parse_update_time)]
    pub update_time: Option<UpdateTime>,

    #[arg(long)]
    pub new_name: Option<String>,

    #[arg(long, action = ArgAction::Set)]
    pub enabled: Option<bool>,
}

impl UpdateFlags {
    pub fn comment(&self) -> Patch<String> {
        Patch::from_option(self.comment.clone())
    }

    pub fn create_time(&self) -> Patch<DateTime<Utc>> {
        Patch::from_option(self.create_time)
    }

    pub fn update_time(&self) -> Patch<DateTime<Utc>> {
        match &self.update_time {
            None => Patch::Set(now()),
            Some(UpdateTime::Unset) => Patch::Keep,
            Some(UpdateTime::At(t)) => Patch::Set(*t),
        }
    }

    pub fn new_name(&self) -> Patch<String> {
        Patch::from_option(self.new_name.clone())
    }

    pub fn enabled(&self) -> Patch<bool> {
        Patch::from_option(self.enabled)
    }
}

/// `--confirm` on destructive commands
#[derive(Debug, Args)]
pub struct ConfirmFlag {
    /// Ask for confirmation before running
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub confirm: bool,
}

impl ConfirmFlag {
    /// Prompt on stderr and require `yes` on stdin
    pub fn check(&self) -> anyhow::Result<()> {
        if !self.confirm {
            return Ok(());
        }
        eprint!("Type 'yes' to continue: ");
        std::io::stderr().flush().ok();
        let mut answer = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut answer)
            .context("could not read confirmation")?;
        if answer.trim() != "yes" {
            bail!("unconfirmed change");
        }
        Ok(())
    }
}

/// The directory envstash runs in; the default environment name
pub fn current_dir_name() -> anyhow::Result<String> {
    let dir = std::env::current_dir().context("could not read current directory")?;
    Ok(dir.to_string_lossy().into_owned())
}

/// `name` if given, otherwise the current directory
pub fn env_name_or_cwd(name: Option<String>) -> anyhow::Result<String> {
    match name {
        Some(name) => Ok(name),
        None => current_dir_name(),
    }
}

/// Read a single line from stdin after printing `prompt` on stderr
pub fn prompt_line(prompt: &str) -> anyhow::Result<String> {
    eprint!("{}", prompt);
    std::io::stderr().flush().ok();
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("could not read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
