use axum::{debug_handler, routing::get, Json, Router};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub(crate) struct Health {
    pub(crate) status: &'static str,
}

#[debug_handler]
async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

// API handlers go here; the SPA is installed behind them.
pub(crate) fn api_router() -> Router {
    Router::new().route("/api/health", get(health))
}

pub(crate) async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
