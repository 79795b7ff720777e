//! Campaign resolution for one batch of references.
//!
//! The provider campaign listing is fetched at most once per batch, and only
//! when some named reference falls through the local waterfall steps.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use zoneguard_core::campaign_identity::{
    resolve, resolve_local, CampaignRef, MappingTable, ProviderCampaign, Resolution,
};
use zoneguard_core::gateway::{GatewayError, ProviderGateway};

use crate::calls::guarded;

/// A reference paired with how it resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCampaign {
    pub reference: CampaignRef,
    pub resolution: Resolution,
}

#[derive(Debug, Default)]
pub struct ResolutionBatch {
    /// One entry per input reference, in input order.
    pub campaigns: Vec<ResolvedCampaign>,
    /// Set when the listing was needed but could not be fetched.
    pub listing_error: Option<GatewayError>,
}

impl ResolutionBatch {
    pub fn unresolved(&self) -> impl Iterator<Item = &ResolvedCampaign> {
        self.campaigns
            .iter()
            .filter(|c| c.resolution == Resolution::Unresolved)
    }

    pub fn ignored_count(&self) -> usize {
        self.campaigns
            .iter()
            .filter(|c| c.resolution == Resolution::Ignored)
            .count()
    }
}

/// Resolve every reference against the mapping table and, if needed, the
/// provider listing.
pub async fn resolve_batch(
    refs: &[CampaignRef],
    mappings: &MappingTable,
    gateway: &dyn ProviderGateway,
    timeout: Duration,
    cancel: &CancellationToken,
) -> ResolutionBatch {
    let local: Vec<Option<Resolution>> = refs.iter().map(|r| resolve_local(r, mappings)).collect();
    let needs_listing = refs
        .iter()
        .zip(&local)
        .any(|(r, l)| l.is_none() && r.name.is_some());

    let mut listing_error = None;
    let listing: Vec<ProviderCampaign> = if needs_listing {
        match guarded(gateway.list_campaigns(), timeout, cancel).await {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!(error = %e, "Provider campaign listing unavailable, name matching skipped");
                listing_error = Some(e);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let campaigns = refs
        .iter()
        .zip(local)
        .map(|(reference, local)| {
            let resolution = local.unwrap_or_else(|| resolve(reference, mappings, &listing));
            match &resolution {
                Resolution::Resolved {
                    provider_id,
                    strategy,
                } => tracing::debug!(
                    campaign = %reference.id,
                    provider_id = %provider_id,
                    ?strategy,
                    "Resolved campaign",
                ),
                Resolution::Ignored => {
                    tracing::debug!(campaign = %reference.id, "Campaign ignored by mapping")
                }
                Resolution::Unresolved => {
                    tracing::info!(campaign = %reference.id, name = ?reference.name, "Campaign unresolved")
                }
            }
            ResolvedCampaign {
                reference: reference.clone(),
                resolution,
            }
        })
        .collect();

    ResolutionBatch {
        campaigns,
        listing_error,
    }
}
