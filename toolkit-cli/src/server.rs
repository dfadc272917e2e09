//! Listener and shared router layers for the demo servers

use anyhow::{Context, Result};
use axum::Router;
use console::style;
use std::path::Path;
use tokio::net::TcpListener;
use toolkit::files::static_files;
use tower_http::trace::TraceLayer;

/// Serves `root` at `/` for unmatched paths and traces every request
pub fn finish_router(router: Router, root: &Path) -> Router {
    router
        .fallback_service(static_files(root))
        .layer(TraceLayer::new_for_http())
}

/// Binds `host:port` and serves `app` until Ctrl-C
pub async fn serve(app: Router, host: &str, port: u16) -> Result<()> {
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {host}:{port}"))?;
    let addr = listener.local_addr()?;

    tracing::info!(%addr, "Starting server");
    println!(
        "{} {}",
        style("Listening on").green().bold(),
        style(format!("http://{addr}")).cyan()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
