//! Core domain logic for the bounded todo list.
//! This crate is the single source of truth for collection invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::filter::{TaskFilter, TaskFilterParseError};
pub use model::state::{StateValidationError, TodoState};
pub use model::task::{Task, TaskId, TaskValidationError, MAX_TASKS};
pub use repo::snapshot::{
    decode_snapshot, encode_snapshot, SnapshotError, SNAPSHOT_VERSION, STATE_STORAGE_KEY,
};
pub use repo::state_repo::{
    MemoryStateStorage, RepoError, RepoResult, SqliteStateStorage, StateStorage,
};
pub use service::interaction::{DeleteConfirmation, DeleteTarget, EditKey, TaskEditor};
pub use service::todo_store::{StoreAction, SubscriptionId, TodoStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
