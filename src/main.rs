//! Price forecast server binary.

use std::sync::Arc;

use clap::Parser;
use price_forecast::config::Cli;
use price_forecast::{router, AppState, ArtifactStore};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    info!("Price forecast server v{}", env!("CARGO_PKG_VERSION"));
    info!("  Model:  {:?}", cli.model);
    info!("  Scaler: {:?}", cli.scaler);

    let artifacts = ArtifactStore::load(
        &cli.artifact_paths(),
        cli.predictor_config(),
        cli.load_policy(),
    )?;
    if !artifacts.is_complete() {
        warn!("Serving with missing artifacts; /predict will fail until restarted");
    }

    let state = Arc::new(AppState::new(artifacts));
    let app = router(state);

    let addr = cli.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Forecast server ready on http://{} (POST /predict)", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested, draining connections");
}
