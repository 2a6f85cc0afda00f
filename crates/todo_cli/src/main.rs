//! Command-line front end for the bounded todo store.
//!
//! # Responsibility
//! - Resolve configuration, start logging, open the SQLite-backed store.
//! - Hand one subcommand to `commands::run` and map failures to exit codes.

mod commands;
mod config;

use clap::Parser;
use commands::{CliError, Command};
use config::CliConfig;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use todo_core::db::open_db;
use todo_core::{init_logging, SqliteStateStorage, TodoStore};

#[derive(Debug, Parser)]
#[command(name = "todo", version, about = "A five-slot todo list")]
struct Cli {
    /// SQLite database path (env: TODO_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Absolute directory for rolling logs (env: TODO_LOG_DIR).
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = CliConfig::resolve(cli.db, cli.log_dir, cli.log_level);

    match execute(&config, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn execute(config: &CliConfig, command: Command) -> Result<(), CliError> {
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, &log_dir.to_string_lossy())?;
    }

    let conn = open_db(&config.db_path)?;
    let mut store = TodoStore::open(SqliteStateStorage::try_new(&conn)?);

    let stdin = io::stdin();
    let stdout = io::stdout();
    commands::run(command, &mut store, &mut stdin.lock(), &mut stdout.lock())
}
