//! Usage: HTTP listener bootstrap with graceful shutdown.

use axum::Router;
use tokio::net::TcpListener;

pub async fn bind(addr: &str) -> Result<TcpListener, String> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind {addr}: {e}"))
}

pub async fn serve(listener: TcpListener, router: Router) -> Result<(), String> {
    let local_addr = listener
        .local_addr()
        .map_err(|e| format!("failed to read local addr: {e}"))?;
    tracing::info!(addr = %local_addr, "tunelink listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("server error: {e}"))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install ctrl-c handler: {err}");
        return;
    }
    tracing::info!("shutdown signal received");
}
