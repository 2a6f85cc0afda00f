//! Persistence boundary for store state.
//!
//! # Responsibility
//! - Define the key-value slot contract the store persists through.
//! - Encode and decode the versioned `{state, version}` snapshot payload.
//!
//! # Invariants
//! - Slot writes replace the whole value; there are no partial updates.
//! - Decoding rejects payloads that violate collection invariants.

pub mod snapshot;
pub mod state_repo;
