//! Validation of the model's reply
//!
//! The reply must be a JSON array of `{task, priority, category}` objects,
//! optionally wrapped in a Markdown code fence.

use serde_json::Value;
use taskstore::{PrioritizedTask, Priority};
use thiserror::Error;
use tracing::debug;

/// Why a provider reply could not be used
#[derive(Debug, Error)]
pub enum ProviderParseError {
    #[error("reply is not valid JSON: {0}")]
    NotJson(#[from] serde_json::Error),

    #[error("reply is not a JSON array")]
    NotArray,

    #[error("element {index}: {reason}")]
    InvalidElement { index: usize, reason: String },
}

/// Strip surrounding whitespace and one enclosing code fence
fn strip_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    // Drop the info string (e.g. "json") on the opening line
    let body = match rest.split_once('\n') {
        Some((info, body)) if !info.trim_start().starts_with(['[', '{']) => body,
        Some(_) => rest,
        None => rest.trim_start().strip_prefix("json").unwrap_or(rest),
    };
    body.trim()
}

fn string_field<'a>(object: &'a serde_json::Map<String, Value>, key: &str, index: usize) -> Result<&'a str, ProviderParseError> {
    object
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderParseError::InvalidElement {
            index,
            reason: format!("missing or non-string '{}'", key),
        })
}

/// Parse and validate a provider reply into prioritized tasks
pub fn parse_prioritized(reply: &str) -> Result<Vec<PrioritizedTask>, ProviderParseError> {
    let body = strip_fence(reply);
    debug!(bytes = body.len(), "parse_prioritized: called");

    let value: Value = serde_json::from_str(body)?;
    let Value::Array(items) = value else {
        return Err(ProviderParseError::NotArray);
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let object = item.as_object().ok_or_else(|| ProviderParseError::InvalidElement {
                index,
                reason: "not an object".to_string(),
            })?;

            let task = string_field(object, "task", index)?;
            let raw_priority = string_field(object, "priority", index)?;
            let priority = Priority::parse(raw_priority).ok_or_else(|| ProviderParseError::InvalidElement {
                index,
                reason: format!("unknown priority '{}'", raw_priority),
            })?;
            let category = string_field(object, "category", index)?;

            Ok(PrioritizedTask::new(task, priority, category))
        })
        .collect()
}
