//! ZenCache - An in-memory, byte-bounded cache server
//!
//! Serves one shared cache over HTTP and a Redis-like line protocol.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zencache::api::{create_router, AppState};
use zencache::config::Config;
use zencache::resp;

/// Main entry point for the ZenCache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache (starts the expiry sweeper) and metrics registry
/// 4. Bind both listeners
/// 5. Run the line-protocol server as a background task
/// 6. Run the HTTP server until SIGINT/SIGTERM
/// 7. Stop the sweeper and the line-protocol task
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zencache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ZenCache");

    let config = Config::from_env();
    info!(
        "Configuration loaded: capacity_bytes={}, sweep_interval_ms={}, tinylfu={}, http_port={}, resp_port={}",
        config.capacity_bytes,
        config.sweep_interval_ms,
        config.enable_tiny_lfu,
        config.http_port,
        config.resp_port
    );

    let state = AppState::from_config(&config);
    info!("Cache initialized");

    let resp_addr = SocketAddr::from(([0, 0, 0, 0], config.resp_port));
    let resp_listener = tokio::net::TcpListener::bind(resp_addr)
        .await
        .with_context(|| format!("Failed to bind RESP listener on {}", resp_addr))?;
    let resp_handle = tokio::spawn(resp::serve(
        resp_listener,
        state.cache.clone(),
        state.metrics.clone(),
    ));

    let http_addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let http_listener = tokio::net::TcpListener::bind(http_addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {}", http_addr))?;
    info!("HTTP listening on http://{}", http_addr);

    let cache = state.cache.clone();
    let app = create_router(state);

    axum::serve(http_listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    cache.stop();
    resp_handle.abort();
    info!("Expiry sweeper and RESP server stopped");

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
