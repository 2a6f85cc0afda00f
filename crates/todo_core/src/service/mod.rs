//! Store and interaction use-cases.
//!
//! # Responsibility
//! - Own the task collection and route every mutation through one store.
//! - Provide headless helpers for the confirm-before-delete and edit flows.

pub mod interaction;
pub mod todo_store;
