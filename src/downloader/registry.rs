//! Registry of active tasks.
//!
//! A name maps to at most one active [`DownloadTask`]. Insertion goes
//! through the map entry API, which locks a single shard, so two racing
//! submissions for the same name cannot both create a task.

use super::power::PowerHint;
use crate::download::{DownloadTask, TaskId};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Result of [`TaskRegistry::register`].
#[derive(Debug, Clone)]
pub enum Registration {
    /// The task was inserted and must be started.
    Created(Arc<DownloadTask>),
    /// A task with the same name was already active; nothing was inserted.
    Existing(Arc<DownloadTask>),
}

impl Registration {
    pub fn task(&self) -> &Arc<DownloadTask> {
        match self {
            Registration::Created(task) | Registration::Existing(task) => task,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Registration::Created(_))
    }
}

/// Active tasks keyed by name.
pub struct TaskRegistry {
    tasks: DashMap<TaskId, Arc<DownloadTask>>,
    /// Number of active tasks, serialising power hint transitions.
    active: Mutex<usize>,
    power_hint: Arc<dyn PowerHint>,
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl TaskRegistry {
    pub fn new(power_hint: Arc<dyn PowerHint>) -> Self {
        Self {
            tasks: DashMap::new(),
            active: Mutex::new(0),
            power_hint,
        }
    }

    /// Insert `task` unless a task with the same name is already active.
    pub fn register(&self, task: DownloadTask) -> Registration {
        let registration = match self.tasks.entry(task.id().clone()) {
            Entry::Occupied(entry) => Registration::Existing(entry.get().clone()),
            Entry::Vacant(entry) => {
                let task = Arc::new(task);
                entry.insert(task.clone());
                Registration::Created(task)
            }
        };

        if registration.is_created() {
            let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
            *active += 1;
            if *active == 1 {
                debug!("First active download, acquiring power hint");
                self.power_hint.acquire();
            }
        }
        registration
    }

    pub fn get(&self, id: &TaskId) -> Option<Arc<DownloadTask>> {
        self.tasks.get(id).map(|entry| entry.value().clone())
    }

    /// Remove `task`, but only if it is still the instance registered under its name.
    pub fn remove(&self, task: &Arc<DownloadTask>) -> bool {
        let removed = self
            .tasks
            .remove_if(task.id(), |_, current| Arc::ptr_eq(current, task))
            .is_some();

        if removed {
            let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
            *active = active.saturating_sub(1);
            if *active == 0 {
                debug!("No active download left, releasing power hint");
                self.power_hint.release();
            }
        }
        removed
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Names of the active tasks, in no particular order.
    pub fn ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|entry| entry.key().clone()).collect()
    }
}
