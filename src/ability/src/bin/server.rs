//! # Ability Demo Server
//!
//! Serves a small blog whose routes are guarded by `load_and_authorize`.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `PORT` - HTTP server port (default: 8080)
//! - `ABILITY_FIXTURES` - JSON file with users and resources (default: built-in seed)
//! - `RUST_LOG` - Log level (default: info)

use anyhow::Context;
use cretoai_ability::config::ServerConfig;
use cretoai_ability::server::{router, AppState, Fixtures};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ability server v{}", cretoai_ability::VERSION);

    let config = ServerConfig::from_env();
    info!("Configuration: {:?}", config);

    let fixtures = match &config.fixtures {
        Some(path) => Fixtures::load(path)
            .with_context(|| format!("Failed to load fixtures from {}", path.display()))?,
        None => {
            warn!("ABILITY_FIXTURES not set, using built-in seed data");
            Fixtures::seed()?
        }
    };

    let state = AppState::from_fixtures(fixtures)?;
    let app = router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or Ctrl+C
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
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
