//! Gateway error type and its HTTP mapping

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use taskstore::ApiError;
use thiserror::Error;
use tracing::{error, warn};

use super::parse::ProviderParseError;
use crate::llm::LlmError;

/// Everything a gateway request can fail with
///
/// `Display` is the internal description used for logging; clients only ever
/// see `public_message()`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request body is not an object with a list of string tasks")]
    InvalidRequest,

    #[error("empty task list")]
    NoTasks,

    #[error("no provider credential configured")]
    NotConfigured,

    #[error("provider call failed: {0}")]
    Provider(#[from] LlmError),

    #[error("provider reply rejected: {reason}")]
    ProviderParse {
        #[from]
        reason: ProviderParseError,
    },

    #[error("no such endpoint")]
    NotFound,

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRequest | GatewayError::NoTasks => StatusCode::BAD_REQUEST,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::NotConfigured
            | GatewayError::Provider(_)
            | GatewayError::ProviderParse { .. }
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the caller
    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::InvalidRequest => "Invalid request. Expected an array of tasks.",
            GatewayError::NoTasks => "No tasks provided for prioritization.",
            GatewayError::NotConfigured => "AI API key not configured",
            GatewayError::Provider(_) | GatewayError::ProviderParse { .. } => "Failed to process tasks with AI",
            GatewayError::NotFound => "Endpoint not found",
            GatewayError::Internal(_) => "Internal server error",
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            GatewayError::InvalidRequest => "invalid_request",
            GatewayError::NoTasks => "no_tasks",
            GatewayError::NotConfigured => "not_configured",
            GatewayError::Provider(e) => e.kind(),
            GatewayError::ProviderParse { .. } => "provider_parse",
            GatewayError::NotFound => "not_found",
            GatewayError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(kind = self.kind(), cause = %self, "Request failed");
        } else {
            warn!(kind = self.kind(), cause = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(ApiError::new(self.public_message()))).into_response()
    }
}
