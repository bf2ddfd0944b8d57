//! TaskStore - the canonical task list and last prioritization results
//!
//! All mutation goes through the store. Every change to the task list or the
//! results is written through to its durable slot; `is_loading` and `error`
//! live only in memory.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::client::Prioritizer;
use crate::error::{StorageError, StoreError, ValidationError};
use crate::grouping::group_tasks_by_priority;
use crate::storage::SlotStorage;
use crate::types::{PrioritizedTask, Task, TaskGroup};
use crate::{MAX_TASK_LEN, RESULTS_SLOT, TASKS_SLOT};

/// Point-in-time copy of the store state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub tasks: Vec<Task>,
    pub prioritized_tasks: Vec<PrioritizedTask>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    tasks: Vec<Task>,
    prioritized_tasks: Vec<PrioritizedTask>,
    /// Also the single-flight flag for `prioritize`
    is_loading: bool,
    error: Option<String>,
    /// Bumped by `clear_all`; results from a round started earlier are dropped
    generation: u64,
}

/// Persistent task store
///
/// Shareable across tasks (`Arc<TaskStore>`); the state lock is never held
/// across an await.
pub struct TaskStore {
    state: Mutex<State>,
    storage: Box<dyn SlotStorage>,
    client: Arc<dyn Prioritizer>,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Resets `is_loading` when a prioritization round ends, however it ends
struct LoadingGuard<'a> {
    state: &'a Mutex<State>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        debug!("LoadingGuard::drop: clearing is_loading");
        lock(self.state).is_loading = false;
    }
}

impl TaskStore {
    /// Open the store, hydrating both slots before anything can be written
    ///
    /// Missing slots hydrate as empty. Corrupt slots hydrate as empty and are
    /// left on disk until the next write replaces them.
    pub fn open(storage: Box<dyn SlotStorage>, client: Arc<dyn Prioritizer>) -> Self {
        let tasks: Vec<Task> = load_slot(storage.as_ref(), TASKS_SLOT);
        let prioritized_tasks: Vec<PrioritizedTask> = load_slot(storage.as_ref(), RESULTS_SLOT);
        info!(
            task_count = tasks.len(),
            result_count = prioritized_tasks.len(),
            "TaskStore hydrated"
        );

        Self {
            state: Mutex::new(State {
                tasks,
                prioritized_tasks,
                is_loading: false,
                error: None,
                generation: 0,
            }),
            storage,
            client,
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }

    /// Add a task after trimming and validating its text
    ///
    /// On failure the message is also placed in the `error` field.
    pub fn add_task(&self, text: &str) -> Result<Task, StoreError> {
        debug!(text_len = text.len(), "add_task: called");
        let mut state = self.state();

        let text = match validate_text(&state.tasks, text, None) {
            Ok(text) => text,
            Err(e) => {
                debug!(error = %e, "add_task: rejected");
                state.error = Some(e.to_string());
                return Err(e.into());
            }
        };

        let task = Task::new(text);
        state.tasks.push(task.clone());
        state.error = None;
        self.persist(TASKS_SLOT, &state.tasks);

        info!(id = %task.id, "Task added");
        Ok(task)
    }

    /// Remove a task by id; returns whether anything was removed
    pub fn remove_task(&self, id: &str) -> bool {
        debug!(%id, "remove_task: called");
        let mut state = self.state();
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);

        if state.tasks.len() == before {
            debug!(%id, "remove_task: no such task");
            return false;
        }

        self.persist(TASKS_SLOT, &state.tasks);
        info!(%id, "Task removed");
        true
    }

    /// Replace a task's text; returns whether a task was changed
    ///
    /// Applies the same rules as `add_task`, with the duplicate check run
    /// against the other tasks only. An unknown id is a no-op.
    pub fn edit_task(&self, id: &str, text: &str) -> Result<bool, StoreError> {
        debug!(%id, text_len = text.len(), "edit_task: called");
        let mut state = self.state();

        let Some(index) = state.tasks.iter().position(|t| t.id == id) else {
            debug!(%id, "edit_task: no such task");
            return Ok(false);
        };

        let text = match validate_text(&state.tasks, text, Some(id)) {
            Ok(text) => text,
            Err(e) => {
                debug!(error = %e, "edit_task: rejected");
                state.error = Some(e.to_string());
                return Err(e.into());
            }
        };

        state.tasks[index].text = text;
        state.error = None;
        self.persist(TASKS_SLOT, &state.tasks);

        info!(%id, "Task edited");
        Ok(true)
    }

    /// Drop all tasks and results, and erase both slots
    pub fn clear_all(&self) {
        debug!("clear_all: called");
        let mut state = self.state();
        state.tasks.clear();
        state.prioritized_tasks.clear();
        state.generation += 1;

        for slot in [TASKS_SLOT, RESULTS_SLOT] {
            if let Err(e) = self.storage.remove(slot) {
                warn!(%slot, error = %e, "Failed to clear slot");
            }
        }
        info!("All tasks cleared");
    }

    /// Run one prioritization round over the current tasks
    ///
    /// Returns the number of prioritized tasks. On success the previous
    /// results are replaced wholesale; on failure they are kept and `error`
    /// holds the client's message. Results of a round overtaken by
    /// `clear_all` are discarded and the count is 0.
    pub async fn prioritize(&self) -> Result<usize, StoreError> {
        debug!("prioritize: called");
        let (texts, generation) = {
            let mut state = self.state();
            if state.is_loading {
                debug!("prioritize: already in flight");
                return Err(StoreError::Busy);
            }
            if state.tasks.is_empty() {
                let err = StoreError::NoTasks;
                state.error = Some(err.to_string());
                return Err(err);
            }
            state.is_loading = true;
            state.error = None;
            let texts = state.tasks.iter().map(|t| t.text.clone()).collect::<Vec<_>>();
            (texts, state.generation)
        };
        let _loading = LoadingGuard { state: &self.state };

        info!(task_count = texts.len(), "Prioritizing tasks");
        match self.client.prioritize_tasks(texts).await {
            Ok(results) => {
                let mut state = self.state();
                if state.generation != generation {
                    info!(result_count = results.len(), "Store cleared during prioritization, dropping results");
                    return Ok(0);
                }
                let count = results.len();
                state.prioritized_tasks = results;
                self.persist(RESULTS_SLOT, &state.prioritized_tasks);
                info!(result_count = count, "Prioritization complete");
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "Prioritization failed");
                self.state().error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn clear_error(&self) {
        self.state().error = None;
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state();
        StoreSnapshot {
            tasks: state.tasks.clone(),
            prioritized_tasks: state.prioritized_tasks.clone(),
            is_loading: state.is_loading,
            error: state.error.clone(),
        }
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state().tasks.clone()
    }

    pub fn prioritized_tasks(&self) -> Vec<PrioritizedTask> {
        self.state().prioritized_tasks.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    /// Current results grouped High → Medium → Low
    pub fn grouped(&self) -> Vec<TaskGroup> {
        group_tasks_by_priority(&self.state().prioritized_tasks)
    }

    fn persist<T: Serialize>(&self, slot: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(StorageError::from)
            .and_then(|json| self.storage.write(slot, &json));
        if let Err(e) = result {
            warn!(%slot, error = %e, "Failed to save slot");
        }
    }
}

fn load_slot<T: DeserializeOwned + Default>(storage: &dyn SlotStorage, slot: &str) -> T {
    match storage.read(slot) {
        Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
            warn!(%slot, error = %e, "Corrupt slot, starting empty");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            warn!(%slot, error = %e, "Failed to read slot, starting empty");
            T::default()
        }
    }
}

/// Trim and check a task description against the current list
fn validate_text(tasks: &[Task], text: &str, exclude_id: Option<&str>) -> Result<String, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::Empty);
    }
    if text.chars().count() > MAX_TASK_LEN {
        return Err(ValidationError::TooLong);
    }

    let lowered = text.to_lowercase();
    let duplicate = tasks
        .iter()
        .filter(|t| Some(t.id.as_str()) != exclude_id)
        .any(|t| t.text.to_lowercase() == lowered);
    if duplicate {
        return Err(ValidationError::Duplicate);
    }

    Ok(text.to_string())
}
