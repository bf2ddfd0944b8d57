//! LlmClient trait definition

use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless LLM client - each call is one independent single-turn request
///
/// Implementations make exactly one attempt per call.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

/// Send a prepared request and decode a 2xx JSON body
///
/// Non-2xx replies become `ApiError` carrying the raw body.
pub(super) async fn send_json<T: DeserializeOwned>(builder: RequestBuilder, timeout: Duration) -> Result<T, LlmError> {
    let response = builder
        .send()
        .await
        .map_err(|e| LlmError::from_transport(e, timeout))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| LlmError::from_transport(e, timeout))?;

    if !status.is_success() {
        debug!(status = status.as_u16(), "send_json: API error");
        return Err(LlmError::ApiError {
            status: status.as_u16(),
            message: body,
        });
    }

    debug!(status = status.as_u16(), bytes = body.len(), "send_json: success");
    Ok(serde_json::from_str(&body)?)
}
