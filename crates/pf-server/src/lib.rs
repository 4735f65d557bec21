//! pf-server: HTTP API over the portal's object store.
//!
//! This crate ties the storage services from `pf-store` into a running
//! server. It provides:
//!
//! - Axum-based HTTP API for folders and images, with optional auth
//! - Request ID propagation and structured request logging
//! - Background purge of expired login sessions
//! - Graceful shutdown via signal handling

pub mod context;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod session;

use std::net::SocketAddr;
use std::time::Duration;

use pf_core::config::Config;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub use crate::context::AppContext;

/// How often expired sessions are swept.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(300);

/// Start the portalfs server.
///
/// Connects the configured object store, builds the [`AppContext`], binds the
/// listener and serves until a shutdown signal is received.
pub async fn start(config: Config) -> pf_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| pf_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let store = pf_store::connect(&config.storage).await;
    let ctx = AppContext::new(config, store);

    tracing::info!(
        root = ctx.paths.root(),
        storage = ctx.store.name(),
        auth = ctx.config.auth.enabled,
        "Portal ready"
    );

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| pf_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Starting server on {addr}");
    serve(listener, ctx, CancellationToken::new()).await
}

/// Serve `ctx` on an already bound listener until `cancel` fires or the
/// process receives SIGINT/SIGTERM.
pub async fn serve(
    listener: TcpListener,
    ctx: AppContext,
    cancel: CancellationToken,
) -> pf_core::Result<()> {
    let purge_handle =
        session::start_purge_task(ctx.sessions.clone(), SESSION_PURGE_INTERVAL, cancel.clone());

    let app = router::build_router(ctx);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await;

    // Signal background tasks to stop.
    cancel.cancel();
    let _ = purge_handle.await;

    result?;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT, SIGTERM or cancellation).
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {e}");
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
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = cancel.cancelled() => {}
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_store::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn serve_stops_on_cancel() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let ctx = AppContext::new(Config::default(), Arc::new(MemoryStore::new()));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(serve(listener, ctx, cancel.clone()));
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
