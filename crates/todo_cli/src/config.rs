//! Runtime configuration for the CLI.
//!
//! Precedence: command-line flag, then environment variable, then default.
//! Empty or whitespace-only environment values are ignored.

use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "TODO_DB_PATH";
pub const LOG_DIR_ENV: &str = "TODO_LOG_DIR";
const DEFAULT_DB_FILE_NAME: &str = "todo_store.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// SQLite file holding the state slot.
    pub db_path: PathBuf,
    /// Rolling log directory; logging stays off when `None`.
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
}

impl CliConfig {
    /// Resolves configuration against the process environment.
    pub fn resolve(
        db_flag: Option<PathBuf>,
        log_dir_flag: Option<PathBuf>,
        log_level_flag: Option<String>,
    ) -> Self {
        Self::resolve_with(db_flag, log_dir_flag, log_level_flag, |key| {
            std::env::var(key).ok()
        })
    }

    fn resolve_with(
        db_flag: Option<PathBuf>,
        log_dir_flag: Option<PathBuf>,
        log_level_flag: Option<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let from_env = |key: &str| {
            env(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        };

        let db_path = db_flag
            .or_else(|| from_env(DB_PATH_ENV))
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
        let log_dir = log_dir_flag.or_else(|| from_env(LOG_DIR_ENV));
        let log_level = log_level_flag
            .unwrap_or_else(|| todo_core::default_log_level().to_string());

        Self {
            db_path,
            log_dir,
            log_level,
        }
    }
}
