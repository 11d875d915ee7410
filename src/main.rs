use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use realiza_site::{AppState, Config, router, telemetry::setup_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();
    setup_tracing();

    let state = AppState::new(&config)?;
    info!(
        lines = state.catalog.summaries().len(),
        assets = %config.assets_dir.display(),
        photographic_preview = state.visualizer.has_base(),
        "Site backend ready"
    );

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await
        .context("Server error")?;
    Ok(())
}
