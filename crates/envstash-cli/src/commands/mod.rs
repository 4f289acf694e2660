//! Subcommands and the plumbing they share

pub mod common;
pub mod env;
pub mod exec;
pub mod shell;
pub mod var;
pub mod var_ref;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use envstash_core::logging_facility::{self, Profile};
use envstash_core::Service;
use envstash_core_types::RequestContext;
use envstash_engine::{EnvService, Observer, TracedService};

/// Options accepted by every subcommand
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// SQLite database file (default: ~/.config/envstash.db)
    #[arg(long, env = "ENVSTASH_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Give up on database work after this long (e.g. 30s, 10m)
    #[arg(
        long,
        env = "ENVSTASH_TIMEOUT",
        default_value = "10m",
        value_parser = humantime::parse_duration,
        global = true
    )]
    pub timeout: Duration,

    /// Log output on stderr: human, json or off
    #[arg(long, env = "ENVSTASH_LOG", default_value = "off", global = true)]
    pub log_format: Profile,
}

impl GlobalArgs {
    /// The configured database path, falling back to the home directory
    pub fn resolve_db_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        let home = dirs::home_dir()
            .context("could not determine home directory; pass --db-path")?;
        Ok(home.join(".config").join("envstash.db"))
    }

    pub fn request_context(&self) -> RequestContext {
        RequestContext::new().with_timeout(self.timeout)
    }

    fn observer(&self) -> Observer {
        match self.log_format {
            Profile::Test => Observer::disabled(),
            _ => Observer::new("envstash-cli"),
        }
    }
}

pub fn init_logging(global: &GlobalArgs) {
    logging_facility::init(global.log_format);
}

/// Open the database and hand `f` a traced service plus a fresh context
pub fn with_service<T>(
    global: &GlobalArgs,
    f: impl FnOnce(&dyn Service, &RequestContext) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let path = global.resolve_db_path()?;
    let conn = envstash_store::db::open(&path)
        .with_context(|| format!("could not open database: {}", path.display()))?;
    let ctx = global.request_context();
    tracing::debug!(request_id = ctx.request_id.as_str(), "request started");

    let service = TracedService::new(EnvService::new(&conn), global.observer());
    f(&service, &ctx)
}
