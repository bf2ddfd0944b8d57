//! TaskStore error types

use thiserror::Error;

/// Reasons a task description is rejected
///
/// The `Display` text is what the store puts in its `error` field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a task description.")]
    Empty,

    #[error("Task description is too long. Please keep it under 200 characters.")]
    TooLong,

    #[error("This task already exists in your list.")]
    Duplicate,
}

/// Errors returned by TaskStore operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No tasks to prioritize. Please add some tasks first.")]
    NoTasks,

    #[error("A prioritization is already in progress.")]
    Busy,

    #[error(transparent)]
    Prioritization(#[from] PrioritizationError),
}

/// What went wrong during a prioritization round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrioritizationErrorKind {
    /// Connection refused, DNS failure, reset
    Transport,
    /// No reply within the client timeout
    Timeout,
    /// Non-2xx status from the gateway
    Status(u16),
    /// Reply body could not be decoded
    Malformed,
    /// Gateway replied 2xx with `success: false`
    Rejected,
}

/// A failed prioritization round, reduced to one human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PrioritizationError {
    pub kind: PrioritizationErrorKind,
    pub message: String,
}

impl PrioritizationError {
    pub fn new(kind: PrioritizationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Errors from durable slot storage
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
