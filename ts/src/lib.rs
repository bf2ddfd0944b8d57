//! TaskStore - persistent task list for SmartTasks
//!
//! Owns the user's task list and the last set of prioritization results,
//! mirrors both into durable slots, and talks to the prioritization gateway.
//!
//! # Architecture
//!
//! ```text
//! <data_local_dir>/smarttasks/
//! ├── .lock                     # advisory write lock
//! ├── smartTasks.json           # Task[]
//! └── smartTasksResults.json    # PrioritizedTask[]
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use taskstore::{FileStorage, HttpPrioritizer, TaskStore};
//!
//! let storage = FileStorage::open(FileStorage::default_dir())?;
//! let client = HttpPrioritizer::new("http://localhost:3000")?;
//! let store = TaskStore::open(Box::new(storage), Arc::new(client));
//! store.add_task("Renew passport")?;
//! store.prioritize().await?;
//! for group in store.grouped() {
//!     println!("{}: {}", group.priority, group.tasks.len());
//! }
//! ```

mod client;
mod error;
mod grouping;
mod storage;
mod store;
mod types;

pub use client::{HttpPrioritizer, Prioritizer};
pub use error::{PrioritizationError, PrioritizationErrorKind, StorageError, StoreError, ValidationError};
pub use grouping::group_tasks_by_priority;
pub use storage::{FileStorage, MemoryStorage, SlotStorage};
pub use store::{StoreSnapshot, TaskStore};
pub use types::{
    ApiError, HealthResponse, PrioritizeRequest, PrioritizeResponse, PrioritizedTask, Priority, Task, TaskGroup,
};

/// Durable slot holding the task list
pub const TASKS_SLOT: &str = "smartTasks";

/// Durable slot holding the last prioritization results
pub const RESULTS_SLOT: &str = "smartTasksResults";

/// Maximum task description length in characters (after trimming)
pub const MAX_TASK_LEN: usize = 200;

/// Default timeout for a prioritization round (30s, LLM calls are slow)
pub const DEFAULT_CLIENT_TIMEOUT_MS: u64 = 30_000;
