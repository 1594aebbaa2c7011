use axum::extract::State;
use axum::{routing::get, Json, Router};
use dealer_events::FeedStatus;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the inventory backend is reachable.
    pub backend_healthy: bool,
    /// Connection state of the realtime change feed.
    pub realtime: FeedStatus,
}

/// GET /health -- service, backend and change feed health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let backend_healthy = state.backend.health_check().await.is_ok();
    let realtime = *state.feed_status.borrow();

    let status = if backend_healthy && realtime == FeedStatus::Connected {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        backend_healthy,
        realtime,
    })
}

/// Mount health check routes (root level, not under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
