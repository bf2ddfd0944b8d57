//! Gateway tests over a loopback listener

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use smarttasks::gateway::{AppState, router};
use smarttasks::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use smarttasks::prompts::PromptLoader;
use taskstore::{
    HttpPrioritizer, MemoryStorage, PrioritizationErrorKind, PrioritizedTask, Prioritizer, Priority, StoreError,
    TaskStore,
};
use tokio::net::TcpListener;

enum Behavior {
    Reply(String),
    Fail,
    Panic,
    Slow(Duration),
}

/// Scripted provider
struct FakeLlm {
    behavior: Behavior,
    calls: AtomicUsize,
}

impl FakeLlm {
    fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    fn replying(reply: &str) -> Arc<Self> {
        Self::new(Behavior::Reply(reply.to_string()))
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for FakeLlm {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Reply(reply) => Ok(CompletionResponse::text(reply.clone())),
            Behavior::Fail => Err(LlmError::ApiError {
                status: 401,
                message: "invalid api key".to_string(),
            }),
            Behavior::Panic => panic!("provider exploded"),
            Behavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(CompletionResponse::text("[]"))
            }
        }
    }
}

const BUY_MILK_REPLY: &str = r#"[{"task":"Buy milk","priority":"Low","category":"Home"}]"#;

fn state(llm: Arc<FakeLlm>, credentials_configured: bool) -> AppState {
    AppState {
        llm,
        provider: "groq".to_string(),
        credentials_configured,
        max_tokens: 1000,
        temperature: 0.3,
        prompts: Arc::new(PromptLoader::new()),
    }
}

/// Start a gateway on an ephemeral port and return its base URL
async fn spawn_gateway(state: AppState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn post_json(base: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{}/api/prioritize", base))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_health() {
    let base = spawn_gateway(state(FakeLlm::replying("[]"), true)).await;

    let body: Value = reqwest::get(format!("{}/api/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "OK");
    assert_eq!(body["aiService"], "groq");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_missing_tasks_is_invalid_request() {
    let llm = FakeLlm::replying(BUY_MILK_REPLY);
    let base = spawn_gateway(state(llm.clone(), true)).await;

    let (status, body) = post_json(&base, json!({})).await;

    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid request. Expected an array of tasks.");
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_non_list_and_non_string_tasks_are_invalid() {
    let base = spawn_gateway(state(FakeLlm::replying(BUY_MILK_REPLY), true)).await;

    for body in [json!({"tasks": "Buy milk"}), json!({"tasks": ["Buy milk", 42]}), json!(null)] {
        let (status, reply) = post_json(&base, body).await;
        assert_eq!(status, 400);
        assert_eq!(reply["error"], "Invalid request. Expected an array of tasks.");
    }
}

#[tokio::test]
async fn test_non_json_body_is_invalid_request() {
    let base = spawn_gateway(state(FakeLlm::replying(BUY_MILK_REPLY), true)).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/prioritize", base))
        .header("content-type", "text/plain")
        .body("Buy milk")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid request. Expected an array of tasks.");
}

#[tokio::test]
async fn test_empty_tasks() {
    let base = spawn_gateway(state(FakeLlm::replying(BUY_MILK_REPLY), true)).await;

    let (status, body) = post_json(&base, json!({"tasks": []})).await;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "No tasks provided for prioritization.");
}

#[tokio::test]
async fn test_prioritize_success_echoes_provider_array() {
    let base = spawn_gateway(state(FakeLlm::replying(BUY_MILK_REPLY), true)).await;

    let (status, body) = post_json(&base, json!({"tasks": ["Buy milk"]})).await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["originalCount"], 1);
    assert_eq!(body["tasks"], serde_json::from_str::<Value>(BUY_MILK_REPLY).unwrap());
    assert!(
        body["processedAt"]
            .as_str()
            .unwrap()
            .parse::<chrono::DateTime<chrono::Utc>>()
            .is_ok()
    );
}

#[tokio::test]
async fn test_not_configured() {
    let llm = FakeLlm::replying(BUY_MILK_REPLY);
    let base = spawn_gateway(state(llm.clone(), false)).await;

    let (status, body) = post_json(&base, json!({"tasks": ["Buy milk"]})).await;

    assert_eq!(status, 500);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "AI API key not configured");
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_unparseable_reply_is_generic_failure() {
    for reply in [
        "I think you should buy milk first.",
        r#"{"task":"Buy milk"}"#,
        r#"[{"task":"Buy milk","priority":"Urgent","category":"Home"}]"#,
    ] {
        let base = spawn_gateway(state(FakeLlm::replying(reply), true)).await;
        let (status, body) = post_json(&base, json!({"tasks": ["Buy milk"]})).await;

        assert_eq!(status, 500, "reply {:?}", reply);
        assert_eq!(body["error"], "Failed to process tasks with AI");
    }
}

#[tokio::test]
async fn test_provider_error_is_generic_failure() {
    let base = spawn_gateway(state(FakeLlm::new(Behavior::Fail), true)).await;

    let (status, body) = post_json(&base, json!({"tasks": ["Buy milk"]})).await;

    assert_eq!(status, 500);
    assert_eq!(body["error"], "Failed to process tasks with AI");
    // The provider's own message never reaches the caller
    assert!(!body.to_string().contains("invalid api key"));
}

#[tokio::test]
async fn test_unknown_route_and_method() {
    let base = spawn_gateway(state(FakeLlm::replying("[]"), true)).await;
    let client = reqwest::Client::new();

    for response in [
        client.get(format!("{}/api/nope", base)).send().await.unwrap(),
        client.get(format!("{}/api/prioritize", base)).send().await.unwrap(),
        client.delete(format!("{}/api/health", base)).send().await.unwrap(),
    ] {
        assert_eq!(response.status().as_u16(), 404);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({"success": false, "error": "Endpoint not found"}));
    }
}

#[tokio::test]
async fn test_panicking_handler_returns_internal_error() {
    let base = spawn_gateway(state(FakeLlm::new(Behavior::Panic), true)).await;

    let (status, body) = post_json(&base, json!({"tasks": ["Buy milk"]})).await;

    assert_eq!(status, 500);
    assert_eq!(body, json!({"success": false, "error": "Internal server error"}));

    // The server keeps serving
    let health = reqwest::get(format!("{}/api/health", base)).await.unwrap();
    assert_eq!(health.status().as_u16(), 200);
}

#[tokio::test]
async fn test_store_round_trip_through_gateway() {
    let reply = r#"```json
[
  {"task":"Renew passport","priority":"high","category":"Personal"},
  {"task":"Buy milk","priority":"Low","category":"Home"},
  {"task":"File taxes","priority":"High","category":"Finance"}
]
```"#;
    let base = spawn_gateway(state(FakeLlm::replying(reply), true)).await;
    let store = TaskStore::open(
        Box::new(MemoryStorage::new()),
        Arc::new(HttpPrioritizer::new(base).unwrap()),
    );
    for text in ["Buy milk", "Renew passport", "File taxes"] {
        store.add_task(text).unwrap();
    }

    assert_eq!(store.prioritize().await.unwrap(), 3);

    let groups = store.grouped();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].priority, Priority::High);
    assert_eq!(
        groups[0].tasks,
        vec![
            PrioritizedTask::new("Renew passport", Priority::High, "Personal"),
            PrioritizedTask::new("File taxes", Priority::High, "Finance"),
        ]
    );
    assert_eq!(groups[1].priority, Priority::Low);
    assert_eq!(store.error(), None);
}

#[tokio::test]
async fn test_store_surfaces_gateway_message() {
    let base = spawn_gateway(state(FakeLlm::replying("not json"), true)).await;
    let store = TaskStore::open(
        Box::new(MemoryStorage::new()),
        Arc::new(HttpPrioritizer::new(base).unwrap()),
    );
    store.add_task("Buy milk").unwrap();

    let err = store.prioritize().await.unwrap_err();

    assert!(matches!(err, StoreError::Prioritization(ref e) if e.kind == PrioritizationErrorKind::Status(500)));
    assert_eq!(store.error().as_deref(), Some("Failed to process tasks with AI"));
    assert!(!store.is_loading());
    assert!(store.prioritized_tasks().is_empty());
}

#[tokio::test]
async fn test_client_timeout_message() {
    let base = spawn_gateway(state(FakeLlm::new(Behavior::Slow(Duration::from_secs(5))), true)).await;
    let client = HttpPrioritizer::with_timeout(base, Duration::from_millis(200)).unwrap();

    let err = client.prioritize_tasks(vec!["Buy milk".to_string()]).await.unwrap_err();

    assert_eq!(err.kind, PrioritizationErrorKind::Timeout);
    assert_eq!(err.message, "timeout of 200ms exceeded");
}

#[tokio::test]
async fn test_client_health_check() {
    let base = spawn_gateway(state(FakeLlm::replying("[]"), true)).await;
    let client = HttpPrioritizer::new(base).unwrap();

    let health = client.check_health().await.unwrap();

    assert_eq!(health.status, "OK");
    assert_eq!(health.ai_service, "groq");
}
