//! Todo store: the single owner of task state.
//!
//! # Responsibility
//! - Apply add/toggle/delete/update/filter/clear mutations.
//! - Persist a full snapshot after every committed mutation.
//! - Rehydrate from storage on open and notify subscribers on change.
//!
//! # Invariants
//! - No operation returns an error; invalid input degrades to a no-op.
//! - Storage failures are logged and never roll back in-memory state.
//! - Rehydration fails closed to the empty default state.
//! - Task text never reaches the log output.

use crate::model::filter::TaskFilter;
use crate::model::state::TodoState;
use crate::model::task::{normalize_text, Task, TaskId};
use crate::repo::snapshot::{decode_snapshot, encode_snapshot, STATE_STORAGE_KEY};
use crate::repo::state_repo::StateStorage;
use log::{debug, error, info, warn};

/// Label attached to every committed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreAction {
    Add,
    Toggle,
    Delete,
    Update,
    SetFilter,
    ClearCompleted,
}

impl StoreAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "todos/add",
            Self::Toggle => "todos/toggle",
            Self::Delete => "todos/delete",
            Self::Update => "todos/update",
            Self::SetFilter => "filter/set",
            Self::ClearCompleted => "todos/clearCompleted",
        }
    }
}

/// Handle returned by `subscribe`; pass it to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&TodoState, StoreAction)>;

/// State container owned by the application root.
pub struct TodoStore<S: StateStorage> {
    state: TodoState,
    storage: S,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<S: StateStorage> TodoStore<S> {
    /// Creates a store and rehydrates it from `storage`.
    pub fn open(storage: S) -> Self {
        let mut store = Self {
            state: TodoState::default(),
            storage,
            listeners: Vec::new(),
            next_subscription: 0,
        };
        store.rehydrate();
        store
    }

    /// Replaces in-memory state with the persisted snapshot.
    ///
    /// Missing, unreadable or corrupt slots reset to the empty default.
    /// Subscribers are not notified.
    pub fn rehydrate(&mut self) {
        self.state = match self.storage.read_slot(STATE_STORAGE_KEY) {
            Ok(Some(payload)) => match decode_snapshot(&payload) {
                Ok(state) => {
                    info!(
                        "event=store_rehydrate module=store status=ok tasks={} filter={}",
                        state.tasks.len(),
                        state.filter
                    );
                    state
                }
                Err(err) => {
                    warn!(
                        "event=store_rehydrate module=store status=fallback reason=corrupt_snapshot error={err}"
                    );
                    TodoState::default()
                }
            },
            Ok(None) => {
                info!("event=store_rehydrate module=store status=empty reason=missing_slot");
                TodoState::default()
            }
            Err(err) => {
                warn!(
                    "event=store_rehydrate module=store status=fallback reason=storage_read_failed error={err}"
                );
                TodoState::default()
            }
        };
    }

    /// Appends a new open task. Blank text and a full list are no-ops.
    pub fn add(&mut self, text: &str) {
        let Ok(task) = Task::new(text) else {
            skip(StoreAction::Add, "blank_text");
            return;
        };
        if self.state.is_at_limit() {
            skip(StoreAction::Add, "limit_reached");
            return;
        }

        self.state.tasks.push(task);
        self.commit(StoreAction::Add);
    }

    /// Flips `completed` on the matching task.
    pub fn toggle(&mut self, id: &TaskId) {
        let Some(task) = self.task_mut(id) else {
            skip(StoreAction::Toggle, "not_found");
            return;
        };

        task.toggle();
        self.commit(StoreAction::Toggle);
    }

    /// Removes the matching task.
    pub fn delete(&mut self, id: &TaskId) {
        let before = self.state.tasks.len();
        self.state.tasks.retain(|task| &task.id != id);
        if self.state.tasks.len() == before {
            skip(StoreAction::Delete, "not_found");
            return;
        }

        self.commit(StoreAction::Delete);
    }

    /// Replaces task text; blank text deletes the task instead.
    ///
    /// Text equal to the current value after trimming is a no-op.
    pub fn update(&mut self, id: &TaskId, text: &str) {
        let Some(text) = normalize_text(text) else {
            self.delete(id);
            return;
        };
        let Some(task) = self.task_mut(id) else {
            skip(StoreAction::Update, "not_found");
            return;
        };
        if task.text == text {
            skip(StoreAction::Update, "unchanged");
            return;
        }

        task.text = text;
        self.commit(StoreAction::Update);
    }

    /// Sets the active view filter.
    pub fn set_filter(&mut self, filter: TaskFilter) {
        if self.state.filter == filter {
            skip(StoreAction::SetFilter, "unchanged");
            return;
        }

        self.state.filter = filter;
        self.commit(StoreAction::SetFilter);
    }

    /// Removes every completed task.
    pub fn clear_completed(&mut self) {
        if !self.state.has_completed() {
            skip(StoreAction::ClearCompleted, "nothing_completed");
            return;
        }

        self.state.tasks.retain(|task| !task.completed);
        self.commit(StoreAction::ClearCompleted);
    }

    /// Registers a listener called after each committed mutation.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&TodoState, StoreAction) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Drops a listener. Returns `false` when `id` is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn state(&self) -> &TodoState {
        &self.state
    }

    pub fn tasks(&self) -> &[Task] {
        &self.state.tasks
    }

    pub fn filter(&self) -> TaskFilter {
        self.state.filter
    }

    pub fn filtered_tasks(&self) -> Vec<&Task> {
        self.state.filtered_tasks()
    }

    pub fn active_count(&self) -> usize {
        self.state.active_count()
    }

    pub fn has_completed(&self) -> bool {
        self.state.has_completed()
    }

    pub fn total_count(&self) -> usize {
        self.state.total_count()
    }

    pub fn is_at_limit(&self) -> bool {
        self.state.is_at_limit()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.state.tasks.iter_mut().find(|task| &task.id == id)
    }

    fn commit(&mut self, action: StoreAction) {
        debug!(
            "event=store_commit module=store status=ok action={} tasks={} filter={}",
            action.as_str(),
            self.state.tasks.len(),
            self.state.filter
        );
        self.persist(action);
        for (_, listener) in &mut self.listeners {
            listener(&self.state, action);
        }
    }

    fn persist(&self, action: StoreAction) {
        let payload = match encode_snapshot(&self.state) {
            Ok(payload) => payload,
            Err(err) => {
                error!(
                    "event=store_persist module=store status=error action={} error_code=encode_failed error={err}",
                    action.as_str()
                );
                return;
            }
        };

        if let Err(err) = self.storage.write_slot(STATE_STORAGE_KEY, &payload) {
            error!(
                "event=store_persist module=store status=error action={} error_code=write_failed error={err}",
                action.as_str()
            );
        }
    }
}

fn skip(action: StoreAction, reason: &str) {
    debug!(
        "event=store_commit module=store status=skipped action={} reason={reason}",
        action.as_str()
    );
}

#[cfg(test)]
mod tests {
    use super::{StoreAction, TodoStore};
    use crate::model::task::TaskId;
    use crate::repo::state_repo::MemoryStateStorage;

    #[test]
    fn no_op_mutations_do_not_write() {
        let mut store = TodoStore::open(MemoryStateStorage::new());
        store.add("   ");
        store.toggle(&TaskId::from("missing"));
        store.update(&TaskId::from("missing"), "text");
        store.clear_completed();
        assert_eq!(store.storage().write_count(), 0);
    }

    #[test]
    fn action_labels_are_stable() {
        assert_eq!(StoreAction::ClearCompleted.as_str(), "todos/clearCompleted");
        assert_eq!(StoreAction::SetFilter.as_str(), "filter/set");
    }
}
