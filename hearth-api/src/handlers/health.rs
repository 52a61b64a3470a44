//! Health check and metrics handlers.

use axum::{
    Json,
    extract::State,
    http::header::CONTENT_TYPE,
    response::IntoResponse,
};
use hearth_telemetry::metrics::render_metrics;
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime_secs: u64,
    /// Open WebSocket connections
    pub active_connections: usize,
    /// Recipient groups with at least one connection
    pub groups: usize,
    /// Notification store backend
    pub store: &'static str,
}

/// Health check handler.
///
/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime_secs(),
        active_connections: state.connections.active_connections(),
        groups: state.service.dispatcher().group_count(),
        store: state.store().backend(),
    })
}

/// Prometheus exposition.
///
/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        render_metrics(),
    )
}
