//! Capacity Agent - snapshot server for the capacity control plane

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use capacity_agent::{api, config::AgentConfig, refresh};
use capacity_lib::{
    health::HealthRegistry,
    observability::{CapacityMetrics, StructuredLogger},
    FileSource, SnapshotSource,
};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting capacity-agent");

    let config = AgentConfig::load()?;
    info!(
        instance = %config.instance_name,
        snapshot_dir = %config.snapshot_dir,
        buffer_pct = config.engine.buffer_pct,
        "Agent configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register_sources().await;

    let metrics = CapacityMetrics::new();
    let logger = StructuredLogger::new(&config.instance_name);
    logger.log_startup(AGENT_VERSION, &config.snapshot_dir);

    let app_state = Arc::new(api::AppState::new(
        health_registry,
        metrics,
        logger.clone(),
        config.engine,
    ));

    let source: Arc<dyn SnapshotSource> = Arc::new(FileSource::new(&config.snapshot_dir));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let refresh_handle = tokio::spawn(refresh::refresh_loop(
        app_state.clone(),
        source,
        Duration::from_secs(config.refresh_interval_secs.max(1)),
        shutdown_rx,
    ));

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            logger.log_shutdown("SIGINT received");
        }
        result = api_handle => {
            match result {
                Ok(Err(err)) => error!(error = %err, "API server failed"),
                Err(err) => error!(error = %err, "API server task panicked"),
                Ok(Ok(())) => {}
            }
            logger.log_shutdown("API server stopped");
        }
    }

    let _ = shutdown_tx.send(true);
    let _ = refresh_handle.await;
    info!("Shutting down");

    Ok(())
}
