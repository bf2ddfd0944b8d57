//! Prioritization client
//!
//! Sends the task texts to the gateway and maps the reply, or any failure, to
//! either the result list or a single human-readable error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::DEFAULT_CLIENT_TIMEOUT_MS;
use crate::error::{PrioritizationError, PrioritizationErrorKind};
use crate::types::{HealthResponse, PrioritizeRequest, PrioritizeResponse, PrioritizedTask};

/// Anything that can turn an ordered list of task texts into prioritized tasks
///
/// One call is one attempt: implementations do not retry.
#[async_trait]
pub trait Prioritizer: Send + Sync {
    async fn prioritize_tasks(&self, tasks: Vec<String>) -> Result<Vec<PrioritizedTask>, PrioritizationError>;
}

/// HTTP client for the SmartTasks gateway
#[derive(Debug, Clone)]
pub struct HttpPrioritizer {
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl HttpPrioritizer {
    /// Create a client with the default 30 second timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self, PrioritizationError> {
        Self::with_timeout(base_url, Duration::from_millis(DEFAULT_CLIENT_TIMEOUT_MS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, PrioritizationError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(%base_url, ?timeout, "HttpPrioritizer::with_timeout: called");

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PrioritizationError::new(PrioritizationErrorKind::Transport, e.to_string()))?;

        Ok(Self {
            base_url,
            http,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the gateway whether it is up and which provider it uses
    pub async fn check_health(&self) -> Result<HealthResponse, PrioritizationError> {
        let url = format!("{}/api/health", self.base_url);
        debug!(%url, "check_health: called");

        let not_responding = |reason: String| {
            warn!(%reason, "check_health: gateway not responding");
            PrioritizationError::new(PrioritizationErrorKind::Transport, "Server is not responding")
        };

        let response = self.http.get(&url).send().await.map_err(|e| not_responding(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(not_responding(format!("status {}", status)));
        }
        response
            .json::<HealthResponse>()
            .await
            .map_err(|e| not_responding(e.to_string()))
    }

    fn transport_error(&self, err: reqwest::Error) -> PrioritizationError {
        if err.is_timeout() {
            debug!("transport_error: request timed out");
            PrioritizationError::new(
                PrioritizationErrorKind::Timeout,
                format!("timeout of {}ms exceeded", self.timeout.as_millis()),
            )
        } else {
            debug!(error = %err, "transport_error: request failed");
            PrioritizationError::new(PrioritizationErrorKind::Transport, err.to_string())
        }
    }
}

#[async_trait]
impl Prioritizer for HttpPrioritizer {
    async fn prioritize_tasks(&self, tasks: Vec<String>) -> Result<Vec<PrioritizedTask>, PrioritizationError> {
        let url = format!("{}/api/prioritize", self.base_url);
        info!(%url, task_count = tasks.len(), "Making POST request");

        let response = self
            .http
            .post(&url)
            .json(&PrioritizeRequest { tasks })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        info!(%url, status = status.as_u16(), "Response received");

        if !status.is_success() {
            // Prefer the gateway's own message over the bare status
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
            warn!(status = status.as_u16(), %message, "prioritize_tasks: gateway returned error");
            return Err(PrioritizationError::new(
                PrioritizationErrorKind::Status(status.as_u16()),
                message,
            ));
        }

        let parsed: PrioritizeResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "prioritize_tasks: malformed response body");
            PrioritizationError::new(
                PrioritizationErrorKind::Malformed,
                format!("Invalid response from server: {}", e),
            )
        })?;

        if !parsed.success {
            return Err(PrioritizationError::new(
                PrioritizationErrorKind::Rejected,
                "Failed to prioritize tasks",
            ));
        }

        debug!(result_count = parsed.tasks.len(), "prioritize_tasks: success");
        Ok(parsed.tasks)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpPrioritizer::new("http://localhost:3000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpPrioritizer::with_timeout(format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        let err = client.prioritize_tasks(vec!["Buy milk".to_string()]).await.unwrap_err();
        assert_eq!(err.kind, PrioritizationErrorKind::Transport);
        assert!(!err.message.is_empty());
    }

    #[tokio::test]
    async fn test_health_check_reports_not_responding() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpPrioritizer::new(format!("http://{}", addr)).unwrap();
        let err = client.check_health().await.unwrap_err();
        assert_eq!(err.message, "Server is not responding");
    }

    #[tokio::test]
    async fn test_mock_prioritizer_records_calls() {
        let mock = mock::MockPrioritizer::new(vec![Ok(vec![])]);
        mock.prioritize_tasks(vec!["a".to_string(), "b".to_string()]).await.unwrap();
        assert!(mock.prioritize_tasks(vec![]).await.is_err());
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.calls()[0], vec!["a".to_string(), "b".to_string()]);
    }
}
