//! Bounded task collection plus active filter.
//!
//! # Responsibility
//! - Hold the `{tasks, filter}` pair that is persisted as one snapshot.
//! - Provide the derived reads consumed by view layers.
//!
//! # Invariants
//! - `tasks.len() <= MAX_TASKS`.
//! - Task ids are unique.
//! - `tasks` keeps insertion order.

use crate::model::filter::TaskFilter;
use crate::model::task::{Task, TaskId, TaskValidationError, MAX_TASKS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Collection-level invariant violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValidationError {
    TooManyTasks { count: usize },
    DuplicateId(TaskId),
    InvalidTask { id: TaskId, reason: TaskValidationError },
}

impl Display for StateValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooManyTasks { count } => {
                write!(f, "collection holds {count} tasks; limit is {MAX_TASKS}")
            }
            Self::DuplicateId(id) => write!(f, "duplicate task id: {id}"),
            Self::InvalidTask { id, reason } => write!(f, "invalid task {id}: {reason}"),
        }
    }
}

impl Error for StateValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTask { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Persisted store state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoState {
    pub tasks: Vec<Task>,
    pub filter: TaskFilter,
}

impl TodoState {
    /// Checks collection invariants.
    pub fn validate(&self) -> Result<(), StateValidationError> {
        if self.tasks.len() > MAX_TASKS {
            return Err(StateValidationError::TooManyTasks {
                count: self.tasks.len(),
            });
        }

        let mut seen = HashSet::with_capacity(self.tasks.len());
        for task in &self.tasks {
            task.validate()
                .map_err(|reason| StateValidationError::InvalidTask {
                    id: task.id.clone(),
                    reason,
                })?;
            if !seen.insert(&task.id) {
                return Err(StateValidationError::DuplicateId(task.id.clone()));
            }
        }
        Ok(())
    }

    /// Looks up one task by id.
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    /// Tasks visible under the active filter, in insertion order.
    pub fn filtered_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| self.filter.matches(task))
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|task| !task.completed).count()
    }

    pub fn has_completed(&self) -> bool {
        self.tasks.iter().any(|task| task.completed)
    }

    pub fn total_count(&self) -> usize {
        self.tasks.len()
    }

    /// Whether another `add` would be rejected.
    pub fn is_at_limit(&self) -> bool {
        self.total_count() >= MAX_TASKS
    }
}
