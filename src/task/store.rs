//! Task state store.
//!
//! Holds the live state of every submitted task. The orchestrator and its
//! background workers share one store behind an `Arc`, so implementations
//! must be internally synchronized.

use std::collections::HashMap;
use std::sync::RwLock;

use super::types::{TaskIdentity, TaskState};

/// Storage seam for task state.
pub trait TaskStore: Send + Sync {
    fn get(&self, task_id: &str) -> Option<TaskState>;
    fn put(&self, state: TaskState);
    fn remove(&self, task_id: &str) -> Option<TaskState>;
    /// Most recently updated task with this identity, if any.
    fn find_by_identity(&self, identity: &TaskIdentity) -> Option<TaskState>;
}

/// In-memory store. Task state does not outlive the process; recovery
/// snapshots cover restarts.
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<String, TaskState>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for InMemoryTaskStore {
    fn get(&self, task_id: &str) -> Option<TaskState> {
        match self.tasks.read() {
            Ok(map) => map.get(task_id).cloned(),
            Err(poisoned) => poisoned.into_inner().get(task_id).cloned(),
        }
    }

    fn put(&self, state: TaskState) {
        match self.tasks.write() {
            Ok(mut map) => {
                map.insert(state.task_id.clone(), state);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(state.task_id.clone(), state);
            }
        }
    }

    fn remove(&self, task_id: &str) -> Option<TaskState> {
        match self.tasks.write() {
            Ok(mut map) => map.remove(task_id),
            Err(poisoned) => poisoned.into_inner().remove(task_id),
        }
    }

    fn find_by_identity(&self, identity: &TaskIdentity) -> Option<TaskState> {
        let map = match self.tasks.read() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.values()
            .filter(|state| &state.identity == identity)
            .max_by(|a, b| a.updated_at.cmp(&b.updated_at))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::types::TaskStatus;

    fn identity(file: &str) -> TaskIdentity {
        TaskIdentity {
            file_id: file.into(),
            column_name: "claims".into(),
            sheet_name: "Sheet1".into(),
            patent_column_name: None,
        }
    }

    #[test]
    fn put_get_remove() {
        let store = InMemoryTaskStore::new();
        let state = TaskState::new(identity("f1"), 3);
        let id = state.task_id.clone();

        store.put(state);
        assert!(store.get(&id).is_some());

        let removed = store.remove(&id);
        assert!(removed.is_some());
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn find_by_identity_picks_latest() {
        let store = InMemoryTaskStore::new();

        let mut older = TaskState::new(identity("f1"), 3);
        older.updated_at = "2026-01-01T00:00:00Z".into();
        older.status = TaskStatus::Completed;
        let mut newer = TaskState::new(identity("f1"), 3);
        newer.updated_at = "2026-06-01T00:00:00Z".into();
        let newer_id = newer.task_id.clone();

        store.put(older);
        store.put(newer);

        let found = store.find_by_identity(&identity("f1")).unwrap();
        assert_eq!(found.task_id, newer_id);
    }

    #[test]
    fn find_by_identity_ignores_other_files() {
        let store = InMemoryTaskStore::new();
        store.put(TaskState::new(identity("f1"), 3));
        assert!(store.find_by_identity(&identity("f2")).is_none());
    }
}
