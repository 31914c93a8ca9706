use std::sync::Arc;

use anyhow::Context;
use recast_client::{HelixClient, HelixConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod repository;
pub mod service;

use config::Config;
use service::{Orchestrator, StandardPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "recast_orchestrator=debug,recast_compiler=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Recast Orchestrator...");

    let config = Config::from_env().context("Invalid configuration")?;
    config.validate().context("Invalid configuration")?;

    match config.stage_timeout {
        Some(timeout) => tracing::info!("External processes time out after {}s", timeout.as_secs()),
        None => tracing::warn!(
            "STAGE_TIMEOUT_SECS is not set; a hung runner or merge will block the queue"
        ),
    }

    let helix = match HelixConfig::from_env() {
        Ok(helix) => {
            tracing::info!("Publishing results to Helix at {}", helix.url);
            Some(HelixClient::new(helix))
        }
        Err(e) => {
            tracing::warn!("Result publishing disabled: {}", e);
            None
        }
    };

    let config = Arc::new(config);
    let pipeline = Arc::new(StandardPipeline::new(config.clone(), helix));
    let orchestrator = Orchestrator::new(pipeline, config.history_limit);

    // Build router with all API endpoints
    let app = api::create_router(orchestrator.clone());

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    tracing::info!("Server stopped, waiting for queued jobs to finish...");
    orchestrator.wait_idle().await;
    tracing::info!("Queue drained, exiting");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown requested"),
        Err(e) => {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
