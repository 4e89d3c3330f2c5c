//! # nexus-server
//!
//! Headless host of the Nexus dashboard state core.
//!
//! This binary provides:
//! - the crypto, weather and news stores, kept fresh by periodic polling
//! - the simulated push feed (price ticks, weather alerts)
//! - persisted favorites and notification log (SQLite)
//! - a JSON API (axum) over the stores plus a server-sent event stream

mod api;
mod config;
mod error;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nexus_client::Dashboard;
use nexus_shared::constants::APP_NAME;

use crate::api::AppState;
use crate::config::NexusConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,nexus_server=debug,nexus_client=debug,nexus_store=info")
        }))
        .init();

    info!("Starting {} server v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = NexusConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Build the dashboard and start background work
    // -----------------------------------------------------------------------
    let dashboard_config = config.dashboard_config();
    let dashboard = Arc::new(Dashboard::open(&dashboard_config)?);
    let tasks = dashboard.start(dashboard_config.feed, dashboard_config.poll);

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server until it fails or Ctrl+C arrives
    // -----------------------------------------------------------------------
    let shutdown = CancellationToken::new();
    let state = AppState {
        dashboard: dashboard.clone(),
        shutdown: shutdown.clone(),
    };

    let server = tokio::spawn(api::serve(state, config.http_addr, shutdown.clone()));

    let outcome: anyhow::Result<()> = tokio::select! {
        result = server => match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "HTTP server failed");
                Err(e)
            }
            Err(e) => {
                tracing::error!(error = %e, "HTTP server task panicked");
                Err(e.into())
            }
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    };

    // -----------------------------------------------------------------------
    // 5. Teardown: stop in-flight requests, then the timers
    // -----------------------------------------------------------------------
    shutdown.cancel();
    tasks.shutdown().await;

    outcome
}
