use zoneguard_core::error::CoreError;
use zoneguard_core::gateway::GatewayError;
use zoneguard_core::store::StoreError;

/// Failure of a whole orchestrator run.
///
/// Per-campaign provider failures are not errors; they are reported as
/// diagnostics inside the run's outcome.
#[derive(Debug, thiserror::Error)]
pub enum SuppressionError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The reporting snapshot was required and could not be fetched.
    #[error("Reporting service unavailable: {0}")]
    Reporting(GatewayError),
}
