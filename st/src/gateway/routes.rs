//! Route handlers

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use chrono::Utc;
use serde_json::Value;
use taskstore::{HealthResponse, PrioritizeResponse};
use tracing::{debug, info};

use super::AppState;
use super::error::GatewayError;
use super::parse::parse_prioritized;
use crate::llm::CompletionRequest;

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    debug!("health: called");
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now(),
        ai_service: state.provider.clone(),
    })
}

/// `POST /api/prioritize`
pub async fn prioritize(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PrioritizeResponse>, GatewayError> {
    let Json(body) = body.map_err(|rejection| {
        debug!(%rejection, "prioritize: body rejected");
        GatewayError::InvalidRequest
    })?;
    prioritize_tasks(&state, &body).await.map(Json)
}

/// Fallback for unknown paths and methods
pub async fn not_found() -> GatewayError {
    GatewayError::NotFound
}

/// Pull `tasks` out of the request body
///
/// Anything but a list of strings is an invalid request.
fn extract_tasks(body: &Value) -> Result<Vec<String>, GatewayError> {
    let items = body
        .get("tasks")
        .and_then(Value::as_array)
        .ok_or(GatewayError::InvalidRequest)?;

    let tasks = items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or(GatewayError::InvalidRequest)?;

    if tasks.is_empty() {
        return Err(GatewayError::NoTasks);
    }
    Ok(tasks)
}

/// Validate the request, ask the provider and validate its reply
pub async fn prioritize_tasks(state: &AppState, body: &Value) -> Result<PrioritizeResponse, GatewayError> {
    let tasks = extract_tasks(body)?;
    debug!(task_count = tasks.len(), "prioritize_tasks: called");

    if !state.credentials_configured {
        return Err(GatewayError::NotConfigured);
    }

    info!(task_count = tasks.len(), provider = %state.provider, "Processing tasks with AI");
    let prompt = state
        .prompts
        .prioritize_prompt(&tasks)
        .map_err(|e| GatewayError::Internal(e.to_string()))?;

    let request = CompletionRequest::new(prompt, state.max_tokens, state.temperature);
    let response = state.llm.complete(request).await?;
    debug!(
        input_tokens = response.usage.input_tokens,
        output_tokens = response.usage.output_tokens,
        "prioritize_tasks: provider replied"
    );

    let prioritized = parse_prioritized(&response.content)?;
    info!(result_count = prioritized.len(), "Prioritization complete");

    Ok(PrioritizeResponse {
        success: true,
        tasks: prioritized,
        original_count: tasks.len(),
        processed_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{CompletionResponse, LlmError};
    use crate::prompts::PromptLoader;
    use serde_json::json;
    use std::sync::Arc;
    use taskstore::{PrioritizedTask, Priority};

    fn state_with(llm: Arc<MockLlmClient>, credentials_configured: bool) -> AppState {
        AppState {
            llm,
            provider: "groq".to_string(),
            credentials_configured,
            max_tokens: 1000,
            temperature: 0.3,
            prompts: Arc::new(PromptLoader::new()),
        }
    }

    #[test]
    fn test_extract_tasks() {
        assert_eq!(
            extract_tasks(&json!({"tasks": ["a", "b"]})).unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(matches!(extract_tasks(&json!({})), Err(GatewayError::InvalidRequest)));
        assert!(matches!(extract_tasks(&json!({"tasks": "a"})), Err(GatewayError::InvalidRequest)));
        assert!(matches!(extract_tasks(&json!({"tasks": ["a", 1]})), Err(GatewayError::InvalidRequest)));
        assert!(matches!(extract_tasks(&json!(["a"])), Err(GatewayError::InvalidRequest)));
        assert!(matches!(extract_tasks(&json!({"tasks": []})), Err(GatewayError::NoTasks)));
    }

    #[tokio::test]
    async fn test_prioritize_tasks_success() {
        let llm = Arc::new(MockLlmClient::new(vec![CompletionResponse::text(
            r#"[{"task":"Buy milk","priority":"Low","category":"Home"}]"#,
        )]));
        let state = state_with(llm.clone(), true);

        let response = prioritize_tasks(&state, &json!({"tasks": ["Buy milk"]})).await.unwrap();

        assert!(response.success);
        assert_eq!(response.original_count, 1);
        assert_eq!(response.tasks, vec![PrioritizedTask::new("Buy milk", Priority::Low, "Home")]);

        let request = &llm.requests()[0];
        assert!(request.prompt.contains("1. Buy milk"));
        assert_eq!(request.max_tokens, 1000);
    }

    #[tokio::test]
    async fn test_original_count_is_input_length() {
        // The model may merge or drop tasks; the count reflects what was sent
        let llm = Arc::new(MockLlmClient::new(vec![CompletionResponse::text(
            r#"[{"task":"a","priority":"High","category":"Work"}]"#,
        )]));
        let state = state_with(llm, true);

        let response = prioritize_tasks(&state, &json!({"tasks": ["a", "b", "c"]})).await.unwrap();
        assert_eq!(response.original_count, 3);
        assert_eq!(response.tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_validation_happens_before_provider_call() {
        let llm = Arc::new(MockLlmClient::new(vec![]));
        let state = state_with(llm.clone(), true);

        assert!(matches!(
            prioritize_tasks(&state, &json!({"tasks": []})).await,
            Err(GatewayError::NoTasks)
        ));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_not_configured_skips_provider() {
        let llm = Arc::new(MockLlmClient::new(vec![]));
        let state = state_with(llm.clone(), false);

        assert!(matches!(
            prioritize_tasks(&state, &json!({"tasks": ["a"]})).await,
            Err(GatewayError::NotConfigured)
        ));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_and_bad_reply() {
        let llm = Arc::new(MockLlmClient::with_results(vec![
            Err(LlmError::ApiError {
                status: 503,
                message: "overloaded".to_string(),
            }),
            Ok(CompletionResponse::text("Sure! Here is your list.")),
        ]));
        let state = state_with(llm, true);
        let body = json!({"tasks": ["a"]});

        assert!(matches!(
            prioritize_tasks(&state, &body).await,
            Err(GatewayError::Provider(LlmError::ApiError { status: 503, .. }))
        ));
        assert!(matches!(
            prioritize_tasks(&state, &body).await,
            Err(GatewayError::ProviderParse { .. })
        ));
    }
}
