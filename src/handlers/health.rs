//! Health check endpoints.
//!
//! Provides endpoints for monitoring server health and readiness.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Server status
    pub status: &'static str,
    /// Server version
    pub version: &'static str,
}

/// Liveness probe - server is running
///
/// GET /health/live
async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub storage: &'static str,
}

/// Readiness probe - server can accept requests
///
/// GET /health/ready
///
/// Ready means the media directory is enumerable, which covers both
/// existence and permissions.
async fn readiness(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let storage_ok = state.storage.media_count().await.is_ok();

    Json(ReadinessResponse {
        status: if storage_ok { "ready" } else { "not_ready" },
        storage: if storage_ok { "available" } else { "unavailable" },
    })
}

/// Stats response
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub media_count: usize,
    pub thumbnail_count: usize,
}

/// Storage stats endpoint
///
/// GET /health/stats
async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let media_count = state.storage.media_count().await.unwrap_or(0);
    let thumbnail_count = state.storage.thumbnail_count().await.unwrap_or(0);

    Json(StatsResponse {
        media_count,
        thumbnail_count,
    })
}

/// Create health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .route("/stats", get(stats))
}
