use std::time::Duration;

const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 5;

/// Tuning for provider fan-out.
#[derive(Debug, Clone)]
pub struct SuppressionSettings {
    /// Maximum provider calls in flight per operation.
    pub concurrency: usize,
    /// Deadline for a single provider call.
    pub call_timeout: Duration,
}

impl SuppressionSettings {
    /// Load settings from environment variables with defaults.
    ///
    /// | Env Var                         | Default |
    /// |---------------------------------|---------|
    /// | `SUPPRESSION_CONCURRENCY`       | `4`     |
    /// | `SUPPRESSION_CALL_TIMEOUT_SECS` | `5`     |
    pub fn from_env() -> Self {
        let concurrency = std::env::var("SUPPRESSION_CONCURRENCY")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_CONCURRENCY);

        let call_timeout_secs = std::env::var("SUPPRESSION_CALL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_CALL_TIMEOUT_SECS);

        Self {
            concurrency,
            call_timeout: Duration::from_secs(call_timeout_secs),
        }
    }
}

impl Default for SuppressionSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }
}
