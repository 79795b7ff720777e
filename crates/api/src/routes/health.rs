use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether ad network credentials are present.
    pub provider_configured: bool,
    /// Ledger backend label (`postgres` or `memory`).
    pub storage: &'static str,
    /// Whether the ledger backend answered a probe.
    pub storage_healthy: bool,
}

/// GET /health -- returns service, provider and storage health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ledger = &state.suppressor.ledger;
    let storage_healthy = ledger.ping().await.is_ok();

    let status = if storage_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        provider_configured: state.suppressor.gateway.is_configured(),
        storage: ledger.backend(),
        storage_healthy,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
