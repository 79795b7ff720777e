//! Suppression recommendations over a performance snapshot.

use zoneguard_core::recommendation::{recommend, PerformanceSnapshot, Recommendation};

use crate::error::SuppressionError;
use crate::Suppressor;

#[derive(Debug, Clone, Default)]
pub struct PreviewRequest {
    /// Snapshot supplied by the caller; fetched from reporting when absent.
    pub dashboard: Option<PerformanceSnapshot>,
    pub traffic_source_filter: Option<String>,
    pub date_range: Option<String>,
}

impl Suppressor {
    /// Compute recommendations. Never touches the ledger.
    pub async fn preview(&self, request: PreviewRequest) -> Result<Recommendation, SuppressionError> {
        let snapshot = match request.dashboard {
            Some(snapshot) => snapshot,
            None => self
                .reporting
                .snapshot(request.date_range.as_deref())
                .await
                .map_err(SuppressionError::Reporting)?,
        };

        let recommendation = recommend(&snapshot, request.traffic_source_filter.as_deref());
        tracing::debug!(
            campaigns = recommendation.meta.campaigns_considered,
            candidates = recommendation.meta.candidate_count,
            "Computed suppression preview",
        );
        Ok(recommendation)
    }
}
