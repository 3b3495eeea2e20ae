// Route handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use crate::context::AppContext;
use crate::providers::{PromptOptions, PromptResponse, ProviderSettings, ProviderStatus};

/// Body of `POST /llm/executePrompt`
#[derive(Debug, Serialize, Deserialize)]
pub struct ExecutePromptRequest {
    pub provider: String,
    /// Replaces the provider's working configuration before the call
    #[serde(default)]
    pub config: Option<ProviderSettings>,
    pub prompt: String,
    #[serde(default)]
    pub options: PromptOptions,
}

/// Body of `PUT /llm/default`
#[derive(Debug, Serialize, Deserialize)]
pub struct SetDefaultRequest {
    pub provider: String,
}

type AppState = Arc<AppContext>;

pub fn create_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/llm/executePrompt", post(execute_prompt))
        .route("/llm/providers", get(list_providers))
        .route("/llm/providers/:name", put(configure_provider))
        .route("/llm/default", put(set_default))
        .with_state(ctx)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn execute_prompt(
    State(ctx): State<AppState>,
    Json(request): Json<ExecutePromptRequest>,
) -> Result<Json<PromptResponse>, ApiError> {
    let provider = ctx.registry().get_provider(&request.provider)?;
    if let Some(config) = request.config {
        provider.configure(config)?;
    }

    tracing::debug!(
        "Relaying {} char prompt to {}",
        request.prompt.len(),
        provider.name()
    );
    let response = provider
        .execute_prompt(&request.prompt, &request.options)
        .await?;
    Ok(Json(response))
}

async fn list_providers(
    State(ctx): State<AppState>,
) -> Result<Json<Vec<ProviderStatus>>, ApiError> {
    Ok(Json(ctx.registry().get_configurations()?))
}

async fn configure_provider(
    State(ctx): State<AppState>,
    Path(name): Path<String>,
    Json(config): Json<ProviderSettings>,
) -> Result<StatusCode, ApiError> {
    ctx.registry().get_provider(&name)?.configure(config)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_default(
    State(ctx): State<AppState>,
    Json(request): Json<SetDefaultRequest>,
) -> Result<StatusCode, ApiError> {
    ctx.registry().set_default_provider(&request.provider)?;
    Ok(StatusCode::NO_CONTENT)
}
