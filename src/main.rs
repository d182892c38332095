//! Storefront Cache - ops server binary
//!
//! Wires the cache core behind the JSON ops API: loads configuration from the
//! environment, dials the backend (degrading gracefully if it is away), and
//! serves until SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_cache::api::{create_router, AppState};
use storefront_cache::cache::RedisStore;
use storefront_cache::config::Config;

/// Main entry point for the storefront cache ops server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Dial the cache backend (a failed dial degrades, it does not abort)
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first so the debug flag can pick the default level.
    let config = Config::from_env();

    let default_filter = if config.debug_mode {
        "storefront_cache=debug,tower_http=info"
    } else {
        "storefront_cache=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting storefront cache");
    info!(
        "Configuration loaded: backend={}:{}/{}, tenant={}, schema_version={}, port={}",
        config.redis_host,
        config.redis_port,
        config.redis_database,
        config.tenant,
        config.schema_version,
        config.server_port
    );

    // One store instance per process; every handler shares it.
    let store = Arc::new(RedisStore::new(&config));
    if store.connect(&config).await {
        info!("Cache backend connected");
    } else {
        warn!("Cache backend unavailable, serving in degraded mode");
    }

    let state = AppState::new(store, &config);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
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
