//! Todo domain model.
//!
//! # Responsibility
//! - Define the task record, the view filter, and the bounded collection.
//! - Own every collection invariant so store and persistence share one check.
//!
//! # Invariants
//! - Every task is identified by a stable, non-empty `TaskId`.
//! - The collection never holds more than `MAX_TASKS` entries.

pub mod filter;
pub mod state;
pub mod task;
