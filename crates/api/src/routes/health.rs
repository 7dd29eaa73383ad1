use axum::extract::State;
use axum::{routing::get, Json, Router};
use pagepilot_core::collections::BUSINESS;
use pagepilot_db::{Datastore, Query};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the datastore answered a trivial query.
    pub datastore_healthy: bool,
}

/// GET /health -- returns service and datastore health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let datastore_healthy = state
        .store
        .find(BUSINESS, &Query::new().limit(1))
        .await
        .is_ok();

    let status = if datastore_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        datastore_healthy,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
