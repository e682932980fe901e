//! Liveness endpoint for the service variant.
//!
//! `GET /` answers as long as the HTTP process is up; it does not probe the
//! bot thread.

use anyhow::{Context, Result};
use axum::{routing::get, Json, Router};
use serde::Serialize;
use tracing::info;

use crate::shutdown::Shutdown;

pub const STATUS_MESSAGE: &str = "Telegram bot is running with FastAPI";

#[derive(Serialize)]
struct StatusResponse {
    message: &'static str,
}

async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: STATUS_MESSAGE,
    })
}

pub fn router() -> Router {
    Router::new().route("/", get(root))
}

/// Serve the router on `addr` until `shutdown` is triggered.
pub async fn serve(addr: &str, shutdown: Shutdown) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("HTTP server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router())
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await
        .context("Server error")?;

    info!("HTTP server stopped");
    Ok(())
}
