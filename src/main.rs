use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use kelma_api::config::Config;
use kelma_api::repository::COLLECTIONS;
use kelma_api::routes::{self, AppState};
use kelma_api::store;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when the variables come from the environment)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kelma_api=info".parse()?),
        )
        .init();

    info!("Starting Kelma API");

    let config = Config::from_env()?;

    let store = store::connect(&config, COLLECTIONS)
        .await
        .context("Failed to open document store")?;

    let app = routes::build_router(AppState::new(Arc::clone(&store)))
        .layer(TraceLayer::new_for_http())
        .layer(routes::cors_layer(&config.allowed_origins));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    store.close().await;
    info!("Shutdown complete");
    Ok(())
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
