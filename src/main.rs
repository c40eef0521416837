use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod extractor;
mod fetcher;
mod freshness;
mod job;
mod pipeline;
mod search;
mod server;
mod store;
mod utils;
mod views;

use config::{Config, Mode};
use pipeline::{reqwest_transport_factory, run_refresh};
use server::{build_app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cocuma_jobs=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(mode = ?config.mode, path = %config.jobs_path().display(), "Configuration loaded");

    // --- One-shot scrape ---
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "scrape" {
        return scrape_once(config).await;
    }

    serve(config).await
}

async fn scrape_once(config: Config) -> Result<()> {
    let count = tokio::task::spawn_blocking(move || {
        run_refresh(
            &config,
            &reqwest_transport_factory(),
            Mode::Manual.scrape_delay(),
        )
    })
    .await
    .context("Scrape task panicked")?
    .context("Scrape failed, existing jobs file left untouched")?;

    info!(jobs = count, "Scrape complete");
    Ok(())
}

async fn serve(config: Config) -> Result<()> {
    let addr = config.addr();
    let mode = config.mode;
    let app = build_app(AppState::new(config, reqwest_transport_factory()));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    match mode {
        Mode::Manual => info!("Serving jobs on http://{} (manual refresh at /refresh)", addr),
        Mode::Automatic => info!("Serving jobs on http://{} (background refresh when stale)", addr),
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
