//! Prioritization gateway
//!
//! Stateless HTTP front for the configured LLM provider.
//!
//! ```text
//! GET  /api/health      -> { status, timestamp, aiService }
//! POST /api/prioritize  -> { success, tasks, originalCount, processedAt }
//! *                     -> 404 { success: false, error: "Endpoint not found" }
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use eyre::{Context, Result};
use futures::FutureExt;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

mod error;
mod parse;
mod routes;

pub use error::GatewayError;
pub use parse::{ProviderParseError, parse_prioritized};
pub use routes::prioritize_tasks;

use crate::config::Config;
use crate::llm::{LlmClient, create_client};
use crate::prompts::PromptLoader;

/// Immutable state shared by every request
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn LlmClient>,

    /// Provider name reported by the health endpoint
    pub provider: String,

    /// Whether any provider credential was present at startup
    pub credentials_configured: bool,

    pub max_tokens: u32,
    pub temperature: f32,
    pub prompts: Arc<PromptLoader>,
}

impl AppState {
    /// Resolve the provider once and build its client
    pub fn from_config(config: &Config) -> Result<Self> {
        let resolved = config.llm.resolve()?;
        let llm = create_client(&resolved).context("Failed to create LLM client")?;

        Ok(Self {
            llm,
            provider: resolved.provider.name().to_string(),
            credentials_configured: config.credentials_configured(),
            max_tokens: resolved.max_tokens,
            temperature: resolved.temperature,
            prompts: Arc::new(PromptLoader::new()),
        })
    }
}

/// Build the gateway router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health).fallback(routes::not_found))
        .route("/api/prioritize", post(routes::prioritize).fallback(routes::not_found))
        .fallback(routes::not_found)
        .layer(middleware::from_fn(catch_panic))
        .with_state(state)
}

/// Turn a panicking handler into a 500 instead of a dropped connection
async fn catch_panic(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(%path, %message, "Handler panicked");
            GatewayError::Internal(message).into_response()
        }
    }
}

/// Serve on an already-bound listener until Ctrl-C
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr().context("Failed to read listener address")?;
    info!(%addr, provider = %state.provider, "Gateway listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Gateway server failed")
}

/// Bind the configured address and serve
pub async fn run(config: &Config) -> Result<()> {
    let state = AppState::from_config(config)?;
    if state.credentials_configured {
        info!(provider = %state.provider, "API key configured");
    } else {
        warn!("No AI API key configured; prioritization requests will fail");
    }

    let addr = config.server.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind {}", addr))?;
    serve(listener, state).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
