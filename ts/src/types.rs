//! Task, prioritization result and wire types
//!
//! Field names serialize camelCase so stored slots and HTTP bodies share one shape.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;
use uuid::Uuid;

/// A user-entered task awaiting prioritization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Time-ordered unique id (UUIDv7)
    pub id: String,

    /// Trimmed description, 1-200 characters
    pub text: String,

    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a task with a fresh id and the current timestamp
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        debug!(text_len = text.len(), "Task::new: called");
        Self {
            id: Uuid::now_v7().to_string(),
            text,
            created_at: Utc::now(),
        }
    }
}

/// Priority level assigned by the model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// All levels in display order
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Parse a priority name, ignoring case and surrounding whitespace
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::parse(s).ok_or_else(|| format!("Unknown priority: '{}'. Expected High, Medium or Low", s))
    }
}

/// A task annotated by the model with a priority and a one-word category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrioritizedTask {
    /// Echo of the original task text
    pub task: String,

    /// Missing or unrecognized values read as Medium
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Priority,

    #[serde(default)]
    pub category: String,
}

impl PrioritizedTask {
    pub fn new(task: impl Into<String>, priority: Priority, category: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            priority,
            category: category.into(),
        }
    }
}

fn lenient_priority<'de, D>(deserializer: D) -> Result<Priority, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let priority = value
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(Priority::parse)
        .unwrap_or_default();
    Ok(priority)
}

/// Prioritized tasks sharing one priority level, in their original relative order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskGroup {
    pub priority: Priority,
    pub tasks: Vec<PrioritizedTask>,
}

/// Body of `POST /api/prioritize`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrioritizeRequest {
    pub tasks: Vec<String>,
}

/// Successful reply from `POST /api/prioritize`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizeResponse {
    pub success: bool,
    pub tasks: Vec<PrioritizedTask>,
    pub original_count: usize,
    pub processed_at: DateTime<Utc>,
}

/// Error body returned by every failing gateway route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Reply from `GET /api/health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub ai_service: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_new_generates_unique_ids() {
        let a = Task::new("Buy milk");
        let b = Task::new("Buy milk");
        assert_ne!(a.id, b.id);
        assert_eq!(a.text, "Buy milk");
    }

    #[test]
    fn test_task_serializes_camel_case() {
        let task = Task::new("Call mom");
        let json = serde_json::to_value(&task).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!(Priority::parse("High"), Some(Priority::High));
        assert_eq!(Priority::parse(" low "), Some(Priority::Low));
        assert_eq!(Priority::parse("MEDIUM"), Some(Priority::Medium));
        assert_eq!(Priority::parse("urgent"), None);
        assert!("Critical".parse::<Priority>().is_err());
    }

    #[test]
    fn test_prioritized_task_unknown_priority_reads_as_medium() {
        let json = r#"[
            {"task": "a", "priority": "Urgent", "category": "Work"},
            {"task": "b", "category": "Home"},
            {"task": "c", "priority": null, "category": "Home"},
            {"task": "d", "priority": "High", "category": "Health"}
        ]"#;
        let tasks: Vec<PrioritizedTask> = serde_json::from_str(json).unwrap();
        assert_eq!(tasks[0].priority, Priority::Medium);
        assert_eq!(tasks[1].priority, Priority::Medium);
        assert_eq!(tasks[2].priority, Priority::Medium);
        assert_eq!(tasks[3].priority, Priority::High);
    }

    #[test]
    fn test_prioritize_response_wire_shape() {
        let json = r#"{
            "success": true,
            "tasks": [{"task": "Buy milk", "priority": "Low", "category": "Home"}],
            "originalCount": 1,
            "processedAt": "2024-05-01T12:00:00.000Z"
        }"#;
        let resp: PrioritizeResponse = serde_json::from_str(json).unwrap();
        assert!(resp.success);
        assert_eq!(resp.original_count, 1);
        assert_eq!(resp.tasks, vec![PrioritizedTask::new("Buy milk", Priority::Low, "Home")]);
    }

    #[test]
    fn test_api_error_is_unsuccessful() {
        let err = ApiError::new("Endpoint not found");
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"success":false,"error":"Endpoint not found"}"#);
    }
}
