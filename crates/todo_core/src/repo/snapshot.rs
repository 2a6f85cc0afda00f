//! Versioned snapshot payload stored in the state slot.
//!
//! Layout: `{ "state": { "tasks": [...], "filter": "all" }, "version": 1 }`.

use crate::model::state::{StateValidationError, TodoState};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fixed slot key holding the store snapshot.
pub const STATE_STORAGE_KEY: &str = "todos-storage";

/// Schema version written with every snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Snapshot decode/encode failures.
#[derive(Debug)]
pub enum SnapshotError {
    Json(serde_json::Error),
    UnsupportedVersion { found: u32, supported: u32 },
    InvalidState(StateValidationError),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "malformed snapshot payload: {err}"),
            Self::UnsupportedVersion { found, supported } => write!(
                f,
                "snapshot version {found} is not supported (expected {supported})"
            ),
            Self::InvalidState(err) => write!(f, "snapshot violates collection invariants: {err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::InvalidState(err) => Some(err),
            Self::UnsupportedVersion { .. } => None,
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<StateValidationError> for SnapshotError {
    fn from(value: StateValidationError) -> Self {
        Self::InvalidState(value)
    }
}

#[derive(Serialize)]
struct SnapshotOut<'a> {
    state: &'a TodoState,
    version: u32,
}

#[derive(Deserialize)]
struct SnapshotIn {
    state: TodoState,
    version: u32,
}

/// Serializes `state` into the slot payload.
pub fn encode_snapshot(state: &TodoState) -> Result<String, SnapshotError> {
    let payload = serde_json::to_string(&SnapshotOut {
        state,
        version: SNAPSHOT_VERSION,
    })?;
    Ok(payload)
}

/// Parses a slot payload back into state.
///
/// # Errors
/// - `Json` when the payload is not a well-formed snapshot.
/// - `UnsupportedVersion` when `version` differs from `SNAPSHOT_VERSION`.
/// - `InvalidState` when the decoded collection breaks its invariants.
pub fn decode_snapshot(payload: &str) -> Result<TodoState, SnapshotError> {
    let snapshot: SnapshotIn = serde_json::from_str(payload)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: snapshot.version,
            supported: SNAPSHOT_VERSION,
        });
    }
    snapshot.state.validate()?;
    Ok(snapshot.state)
}
