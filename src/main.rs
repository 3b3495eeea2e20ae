// Penwright - Writer and reviewer agents for long-form content
// Main entry point

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use penwright::cli::{self, Cli};
use penwright::config::load_settings;
use penwright::logging::init_tracing;
use penwright::AppContext;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing
    init_tracing(args.verbose);

    // Load configuration
    let settings = load_settings(args.config.clone())?;
    tracing::debug!("Workspace: {}", settings.workspace.display());

    let ctx = Arc::new(AppContext::open(settings)?);

    let result = cli::run(ctx.clone(), args.command).await;
    ctx.shutdown().await;
    result
}
