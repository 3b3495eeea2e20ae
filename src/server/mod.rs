// HTTP surface for the browser editor
//
// Relays prompt execution and provider configuration to the shared
// `AppContext`. Everything else the UI needs lives client-side.

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::{create_router, ExecutePromptRequest, SetDefaultRequest};

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;

/// Request body limit; prompts embed whole sections, so stay generous.
const BODY_LIMIT_BYTES: usize = 4 * 1024 * 1024;

/// Router with the ambient layers applied.
pub fn app(ctx: Arc<AppContext>) -> axum::Router {
    create_router(ctx)
        .layer(axum::extract::DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Serve until the process is interrupted.
pub async fn serve(ctx: Arc<AppContext>, bind_address: &str) -> Result<()> {
    let addr: SocketAddr = bind_address
        .parse()
        .with_context(|| format!("Invalid bind address: {}", bind_address))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Penwright server listening on {}", addr);

    axum::serve(listener, app(ctx))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
        .context("Server error")?;

    tracing::info!("Penwright server stopped");
    Ok(())
}
