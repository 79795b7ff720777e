//! Handler for suppression recommendations.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use validator::Validate;
use zoneguard_core::recommendation::{PerformanceSnapshot, Recommendation};
use zoneguard_suppression::preview::PreviewRequest;

use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PreviewBody {
    /// Snapshot to analyse; fetched from the reporting service when omitted.
    pub dashboard: Option<PerformanceSnapshot>,
    #[validate(length(max = 128))]
    pub traffic_source_filter: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub date_range: Option<String>,
}

/// POST /api/v1/suppression/preview
///
/// Suggested zone rules and zones to pause now. Never writes the ledger.
pub async fn preview(
    State(state): State<AppState>,
    Json(body): Json<PreviewBody>,
) -> AppResult<Json<Recommendation>> {
    body.validate()?;

    let request = PreviewRequest {
        dashboard: body.dashboard,
        traffic_source_filter: body
            .traffic_source_filter
            .filter(|f| !f.trim().is_empty()),
        date_range: body.date_range,
    };
    let recommendation = state.suppressor.preview(request).await?;

    Ok(Json(recommendation))
}
