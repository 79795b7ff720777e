//! Seams to the external HTTP collaborators.
//!
//! [`ProviderGateway`] is the ad network's campaign listing and excluded-zone
//! resource; [`ReportingSource`] is the metrics service. Implementations live
//! in `zoneguard-provider`; orchestrator tests use scripted fakes.

use std::time::Duration;

use async_trait::async_trait;

use crate::campaign_identity::ProviderCampaign;
use crate::recommendation::PerformanceSnapshot;
use crate::zone_extraction::{ExtractionStrategy, ZoneIdSet};

/// Maximum number of characters of a raw body kept in diagnostics.
pub const DIAGNOSTIC_SNIPPET_LEN: usize = 300;

/// Failure of a single call to an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Credentials or base URL are missing. A configuration state, not an
    /// outage; callers must not report it as a server error.
    #[error("Not configured: {0}")]
    Unconfigured(String),

    /// Network, DNS, TLS or timeout failure before a response arrived.
    #[error("Request failed: {message}")]
    Transport { message: String, timed_out: bool },

    /// Non-2xx status. `body` is already truncated.
    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// 2xx status but the body could not be understood.
    #[error("Unrecognised response (HTTP {status}): {body}")]
    Malformed { status: u16, body: String },

    #[error("Cancelled")]
    Cancelled,
}

impl GatewayError {
    pub fn timed_out(after: Duration) -> Self {
        Self::Transport {
            message: format!("timed out after {}ms", after.as_millis()),
            timed_out: true,
        }
    }

    /// HTTP status when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Malformed { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unconfigured(&self) -> bool {
        matches!(self, Self::Unconfigured(_))
    }
}

/// Truncate a response body for inclusion in diagnostics.
pub fn snippet(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(DIAGNOSTIC_SNIPPET_LEN) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

/// Current exclusions for one provider campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedZones {
    pub zones: ZoneIdSet,
    pub status: u16,
    pub strategy: Option<ExtractionStrategy>,
}

/// Provider acknowledgement of a removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalAck {
    pub status: u16,
}

/// The ad network's blacklist resource.
///
/// Implementations make exactly one attempt per call (no retries) and map
/// every failure onto [`GatewayError`].
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Fixed tag stamped on ledger records.
    fn provider_name(&self) -> &str;

    /// False when credentials are missing; every call then returns
    /// [`GatewayError::Unconfigured`].
    fn is_configured(&self) -> bool;

    async fn list_campaigns(&self) -> Result<Vec<ProviderCampaign>, GatewayError>;

    async fn fetch_excluded_zones(
        &self,
        provider_campaign_id: &str,
    ) -> Result<ExcludedZones, GatewayError>;

    async fn remove_exclusion(
        &self,
        provider_campaign_id: &str,
        zone_ids: &[String],
    ) -> Result<RemovalAck, GatewayError>;
}

/// The reporting service that supplies performance snapshots.
#[async_trait]
pub trait ReportingSource: Send + Sync {
    async fn snapshot(&self, date_range: Option<&str>) -> Result<PerformanceSnapshot, GatewayError>;
}
