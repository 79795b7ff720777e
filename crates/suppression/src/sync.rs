//! Import provider-side exclusions into the ledger.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use zoneguard_core::campaign_identity::{CampaignRef, Resolution, ResolutionStrategy};
use zoneguard_core::gateway::GatewayError;
use zoneguard_core::suppression::{active_keys, SuppressionRecord, ZoneKey};
use zoneguard_events::{event_types, SuppressionEvent};

use crate::calls::fetch_excluded;
use crate::error::SuppressionError;
use crate::resolution::resolve_batch;
use crate::Suppressor;

const UNRESOLVED_MESSAGE: &str = "Could not resolve campaign to a provider campaign id";

#[derive(Debug, Clone, Default)]
pub struct SyncRequest {
    /// Explicit campaigns; `None` derives them from the reporting snapshot.
    pub campaigns: Option<Vec<CampaignRef>>,
    pub date_range: Option<String>,
    /// Compute what would be added without writing.
    pub dry_run: bool,
}

/// Per-campaign result of a sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDiagnostic {
    /// Provider campaign id, or the local reference when unresolved.
    pub campaign_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_campaign_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ResolutionStrategy>,
    /// Zones the provider reported as excluded.
    pub fetched: Option<usize>,
    /// HTTP status of the provider response, when one arrived.
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub configured: bool,
    pub dry_run: bool,
    /// The run was cancelled before its ledger write.
    pub cancelled: bool,
    /// Distinct provider campaigns resolved.
    pub resolved_count: usize,
    pub ignored_count: usize,
    /// Records inserted (or, for a dry run, that would have been).
    pub added_count: usize,
    /// Fetch diagnostics ordered by provider campaign id, then unresolved
    /// references in request order.
    pub diagnostics: Vec<SyncDiagnostic>,
}

impl Suppressor {
    pub async fn sync(
        &self,
        request: SyncRequest,
        cancel: &CancellationToken,
    ) -> Result<SyncOutcome, SuppressionError> {
        if !self.gateway.is_configured() {
            tracing::info!("Provider not configured, sync skipped");
            return Ok(SyncOutcome {
                configured: false,
                dry_run: request.dry_run,
                ..SyncOutcome::default()
            });
        }

        let refs = self
            .sync_candidates(request.campaigns, request.date_range.as_deref())
            .await?;
        let table = self.mappings.table().await?;
        let batch = resolve_batch(
            &refs,
            &table,
            self.gateway.as_ref(),
            self.settings.call_timeout,
            cancel,
        )
        .await;

        // Provider id -> first local reference that resolved to it.
        let mut targets: BTreeMap<String, (String, ResolutionStrategy)> = BTreeMap::new();
        for campaign in &batch.campaigns {
            if let Resolution::Resolved {
                provider_id,
                strategy,
            } = &campaign.resolution
            {
                targets
                    .entry(provider_id.clone())
                    .or_insert_with(|| (campaign.reference.id.clone(), *strategy));
            }
        }

        let held = active_keys(&self.ledger.list_all().await?);
        let ids: Vec<String> = targets.keys().cloned().collect();
        let fetched = fetch_excluded(
            &self.gateway,
            &ids,
            self.settings.concurrency,
            self.settings.call_timeout,
            cancel,
        )
        .await;

        let now = Utc::now();
        let provider = self.gateway.provider_name().to_string();
        let mut diagnostics = Vec::with_capacity(fetched.len());
        let mut new_records = Vec::new();
        let mut seen: HashSet<ZoneKey> = HashSet::new();

        for (provider_id, result) in fetched {
            let provider_id = provider_id.as_str();
            let (local_id, strategy) = &targets[provider_id];
            let local_campaign_id = (local_id != provider_id).then(|| local_id.clone());
            let mut diagnostic = SyncDiagnostic {
                campaign_id: provider_id.to_string(),
                local_campaign_id: local_campaign_id.clone(),
                strategy: Some(*strategy),
                fetched: None,
                status: None,
                error: None,
            };

            match result {
                Ok(excluded) => {
                    diagnostic.fetched = Some(excluded.zones.len());
                    diagnostic.status = Some(excluded.status);
                    for zone_id in excluded.zones {
                        let key = ZoneKey::new(provider_id, zone_id.as_str());
                        if held.contains(&key) || !seen.insert(key) {
                            continue;
                        }
                        new_records.push(SuppressionRecord::observed(
                            provider_id,
                            local_campaign_id.clone(),
                            zone_id,
                            provider.as_str(),
                            now,
                        ));
                    }
                }
                Err(e) => {
                    tracing::warn!(campaign_id = provider_id, error = %e, "Failed to fetch excluded zones");
                    diagnostic.status = e.status();
                    diagnostic.error = Some(e.to_string());
                }
            }
            diagnostics.push(diagnostic);
        }

        let listing_error = batch.listing_error.as_ref().map(GatewayError::to_string);
        diagnostics.extend(batch.unresolved().map(|c| SyncDiagnostic {
            campaign_id: c.reference.id.clone(),
            local_campaign_id: None,
            strategy: None,
            fetched: None,
            status: None,
            error: Some(match &listing_error {
                Some(e) => format!("{UNRESOLVED_MESSAGE} (campaign listing failed: {e})"),
                None => UNRESOLVED_MESSAGE.to_string(),
            }),
        }));

        let mut outcome = SyncOutcome {
            configured: true,
            dry_run: request.dry_run,
            cancelled: false,
            resolved_count: targets.len(),
            ignored_count: batch.ignored_count(),
            added_count: new_records.len(),
            diagnostics,
        };

        if cancel.is_cancelled() {
            tracing::info!(pending = new_records.len(), "Sync cancelled, ledger not written");
            outcome.cancelled = true;
            outcome.added_count = 0;
            return Ok(outcome);
        }
        if request.dry_run {
            tracing::info!(would_add = new_records.len(), "Sync dry run complete");
            return Ok(outcome);
        }

        let inserted = if new_records.is_empty() {
            Vec::new()
        } else {
            self.ledger.append(new_records).await?
        };
        outcome.added_count = inserted.len();

        tracing::info!(
            campaigns = outcome.resolved_count,
            added = outcome.added_count,
            unresolved = batch.unresolved().count(),
            "Sync complete",
        );
        self.emit(
            SuppressionEvent::new(event_types::SYNC_COMPLETED).with_payload(serde_json::json!({
                "campaigns": outcome.resolved_count,
                "added": outcome.added_count,
                "zones": inserted
                    .iter()
                    .map(|r| serde_json::json!({ "campaignId": r.campaign_id, "zoneId": r.zone_id }))
                    .collect::<Vec<_>>(),
            })),
        );
        Ok(outcome)
    }

    /// Campaigns a sync works on.
    ///
    /// Explicit references are enriched with names from the reporting
    /// snapshot when one is available; otherwise every campaign in the
    /// snapshot is a candidate.
    async fn sync_candidates(
        &self,
        explicit: Option<Vec<CampaignRef>>,
        date_range: Option<&str>,
    ) -> Result<Vec<CampaignRef>, SuppressionError> {
        match explicit {
            Some(mut refs) => {
                if refs.iter().any(|r| r.name.is_none()) {
                    match self.reporting.snapshot(date_range).await {
                        Ok(snapshot) => {
                            let names: BTreeMap<&str, &str> = snapshot
                                .campaigns
                                .iter()
                                .filter_map(|c| c.name.as_deref().map(|n| (c.id.as_str(), n)))
                                .collect();
                            for r in refs.iter_mut().filter(|r| r.name.is_none()) {
                                r.name = names.get(r.id.as_str()).map(|n| n.to_string());
                            }
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, "Reporting snapshot unavailable, campaign names not enriched");
                        }
                    }
                }
                Ok(refs)
            }
            None => {
                let snapshot = self
                    .reporting
                    .snapshot(date_range)
                    .await
                    .map_err(SuppressionError::Reporting)?;
                Ok(snapshot
                    .campaigns
                    .into_iter()
                    .map(|c| CampaignRef {
                        id: c.id,
                        name: c.name,
                    })
                    .collect())
            }
        }
    }
}
