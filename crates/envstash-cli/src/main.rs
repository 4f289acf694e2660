//! envstash CLI
//!
//! Stores environment variables per directory in SQLite and prints zsh
//! scripts that export them on `cd`.

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::GlobalArgs;

#[derive(Debug, Parser)]
#[command(name = "envstash")]
#[command(about = "envstash - environment variables per directory", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Environment operations
    Env(commands::env::EnvArgs),
    /// Variable and reference operations
    Var(commands::var::VarArgs),
    /// Shell integration
    Shell(commands::shell::ShellArgs),
    /// Run a command with one or more environments applied
    Exec(commands::exec::ExecArgs),
}

fn main() {
    let cli = Cli::parse();
    commands::init_logging(&cli.global);

    let result = match cli.command {
        Commands::Env(args) => commands::env::execute(&cli.global, args),
        Commands::Var(args) => commands::var::execute(&cli.global, args),
        Commands::Shell(args) => commands::shell::execute(&cli.global, args),
        Commands::Exec(args) => commands::exec::execute(&cli.global, args),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
