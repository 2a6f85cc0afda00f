//! Headless interaction state for view layers.
//!
//! # Responsibility
//! - Hold the pending confirmation before a delete reaches the store.
//! - Hold the edit buffer between entering and leaving edit mode.
//!
//! # Invariants
//! - `DeleteConfirmation` only calls `TodoStore::delete` from `confirm`.
//! - `TaskEditor::cancel` never calls `TodoStore::update`.

use crate::model::task::{Task, TaskId};
use crate::repo::state_repo::StateStorage;
use crate::service::todo_store::TodoStore;

/// Task captured when a delete was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTarget {
    pub id: TaskId,
    pub text: String,
}

/// Confirm-before-delete state.
#[derive(Debug, Default)]
pub struct DeleteConfirmation {
    target: Option<DeleteTarget>,
}

impl DeleteConfirmation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a confirmation for `id` if it is in the current filtered view.
    ///
    /// Returns whether a confirmation is now pending for `id`.
    pub fn request<S: StateStorage>(&mut self, store: &TodoStore<S>, id: &TaskId) -> bool {
        let Some(task) = store.filtered_tasks().into_iter().find(|task| &task.id == id) else {
            return false;
        };
        self.target = Some(DeleteTarget {
            id: id.clone(),
            text: task.text.clone(),
        });
        true
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<&DeleteTarget> {
        self.target.as_ref()
    }

    /// Question shown to the user while a confirmation is pending.
    pub fn prompt(&self) -> Option<String> {
        self.target
            .as_ref()
            .map(|target| format!("Delete \"{}\"? This cannot be undone.", target.text))
    }

    /// Deletes the pending target. Returns `false` when nothing was pending.
    pub fn confirm<S: StateStorage>(&mut self, store: &mut TodoStore<S>) -> bool {
        match self.target.take() {
            Some(target) => {
                store.delete(&target.id);
                true
            }
            None => false,
        }
    }

    pub fn cancel(&mut self) {
        self.target = None;
    }
}

/// Keys an edit field reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Enter,
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct EditBuffer {
    id: TaskId,
    text: String,
}

/// In-progress edit of one task.
#[derive(Debug, Default)]
pub struct TaskEditor {
    editing: Option<EditBuffer>,
}

impl TaskEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters edit mode, copying the current task text into the buffer.
    pub fn begin(&mut self, task: &Task) {
        self.editing = Some(EditBuffer {
            id: task.id.clone(),
            text: task.text.clone(),
        });
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn editing_id(&self) -> Option<&TaskId> {
        self.editing.as_ref().map(|buffer| &buffer.id)
    }

    pub fn buffer(&self) -> Option<&str> {
        self.editing.as_ref().map(|buffer| buffer.text.as_str())
    }

    /// Replaces the buffer content. Ignored outside edit mode.
    pub fn set_buffer(&mut self, text: impl Into<String>) {
        if let Some(buffer) = self.editing.as_mut() {
            buffer.text = text.into();
        }
    }

    /// Leaves edit mode and writes the buffer through `TodoStore::update`.
    ///
    /// A blank buffer deletes the task per the store's update rule.
    pub fn submit<S: StateStorage>(&mut self, store: &mut TodoStore<S>) -> bool {
        match self.editing.take() {
            Some(buffer) => {
                store.update(&buffer.id, &buffer.text);
                true
            }
            None => false,
        }
    }

    /// Leaves edit mode without touching the store.
    pub fn cancel(&mut self) {
        self.editing = None;
    }

    /// Enter submits, Escape cancels.
    pub fn handle_key<S: StateStorage>(&mut self, key: EditKey, store: &mut TodoStore<S>) {
        match key {
            EditKey::Enter => {
                self.submit(store);
            }
            EditKey::Escape => self.cancel(),
        }
    }
}
