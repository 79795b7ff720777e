//! Remove exclusions at the provider and retire their ledger records.
//!
//! Records are soft-reverted: the row stays with `reverted=true`, so the
//! history survives and a later sync can suppress the same zone again under
//! a new record.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use zoneguard_core::campaign_identity::CampaignRef;
use zoneguard_core::error::CoreError;
use zoneguard_core::gateway::GatewayError;
use zoneguard_core::suppression::{select_active, RecordRef, RevertUpdate};
use zoneguard_core::types::RecordId;
use zoneguard_events::{event_types, SuppressionEvent};

use crate::calls::guarded;
use crate::error::SuppressionError;
use crate::resolution::resolve_batch;
use crate::Suppressor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevertStatus {
    /// The provider confirmed the removal.
    Removed,
    /// No provider configured; only the ledger was updated.
    DryRun,
    /// The provider call failed or was cancelled.
    Failed,
    /// The campaign could not be mapped to a provider campaign id.
    Unresolved,
}

/// Result for one requested item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertItemResult {
    /// Campaign as given in the request.
    pub campaign_id: String,
    pub zone_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_campaign_id: Option<String>,
    pub ok: bool,
    pub outcome: RevertStatus,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevertOutcome {
    pub configured: bool,
    /// One entry per distinct requested item, in request order.
    pub results: Vec<RevertItemResult>,
    /// Ledger records transitioned to reverted.
    pub records_reverted: usize,
}

/// A requested item with its target provider campaign and matching records.
struct Planned {
    item: RecordRef,
    provider_id: Option<String>,
    record_ids: Vec<RecordId>,
}

impl Suppressor {
    pub async fn revert(
        &self,
        items: Vec<RecordRef>,
        cancel: &CancellationToken,
    ) -> Result<RevertOutcome, SuppressionError> {
        if items.is_empty() {
            return Err(CoreError::Validation("At least one item is required".into()).into());
        }

        let mut seen = HashSet::new();
        let items: Vec<RecordRef> = items
            .into_iter()
            .filter(|i| seen.insert((i.id.clone(), i.campaign_id.trim().to_string(), i.zone_id.trim().to_string())))
            .collect();

        let configured = self.gateway.is_configured();
        let plan = self.plan_revert(items, configured, cancel).await?;

        let now = Utc::now();
        let timeout = self.settings.call_timeout;
        let calls: Vec<BoxFuture<'static, (RevertItemResult, Option<bool>)>> = plan
            .iter()
            .map(|planned| {
                let gateway = Arc::clone(&self.gateway);
                let cancel = cancel.clone();
                let campaign_id = planned.item.campaign_id.clone();
                let zone_id = planned.item.zone_id.trim().to_string();
                let provider_id = planned.provider_id.clone();
                let matched = !planned.record_ids.is_empty();
                async move {
                    let result = |ok, outcome, message: String| RevertItemResult {
                        campaign_id: campaign_id.clone(),
                        zone_id: zone_id.clone(),
                        provider_campaign_id: provider_id.clone(),
                        ok,
                        outcome,
                        message,
                    };

                    if !configured {
                        if !matched {
                            return (
                                result(
                                    false,
                                    RevertStatus::DryRun,
                                    "Provider not configured and no active ledger record matched".into(),
                                ),
                                None,
                            );
                        }
                        return (
                            result(
                                true,
                                RevertStatus::DryRun,
                                "Provider not configured; ledger updated only".into(),
                            ),
                            Some(false),
                        );
                    }
                    let Some(target) = provider_id.as_deref() else {
                        return (
                            result(
                                false,
                                RevertStatus::Unresolved,
                                "Could not resolve campaign to a provider campaign id".into(),
                            ),
                            None,
                        );
                    };

                    let zones = [zone_id.clone()];
                    match guarded(gateway.remove_exclusion(target, &zones), timeout, &cancel).await {
                        Ok(ack) => (
                            result(
                                true,
                                RevertStatus::Removed,
                                format!("Removed at provider (HTTP {})", ack.status),
                            ),
                            Some(true),
                        ),
                        Err(GatewayError::Cancelled) => (
                            result(false, RevertStatus::Failed, "Cancelled".into()),
                            None,
                        ),
                        Err(e) => {
                            tracing::warn!(campaign_id = target, zone_id = %zone_id, error = %e, "Provider removal failed");
                            (result(false, RevertStatus::Failed, e.to_string()), Some(false))
                        }
                    }
                }
                .boxed()
            })
            .collect();
        let results: Vec<(RevertItemResult, Option<bool>)> = stream::iter(calls)
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        // Records are retired whenever removal was attempted or skipped for
        // lack of configuration; `confirmed` only on provider success.
        let mut updates: HashMap<RecordId, RevertUpdate> = HashMap::new();
        for (planned, (_, confirmed)) in plan.iter().zip(&results) {
            let Some(confirmed) = *confirmed else { continue };
            for id in &planned.record_ids {
                updates
                    .entry(*id)
                    .and_modify(|u| u.confirmed |= confirmed)
                    .or_insert(RevertUpdate {
                        id: *id,
                        confirmed,
                        reverted_at: now,
                    });
            }
        }
        let updates: Vec<RevertUpdate> = updates.into_values().collect();
        let records_reverted = if updates.is_empty() {
            0
        } else {
            self.ledger.mark_reverted(&updates).await?
        };

        let results: Vec<RevertItemResult> = results.into_iter().map(|(r, _)| r).collect();
        let count = |status: RevertStatus| results.iter().filter(|r| r.outcome == status).count();
        tracing::info!(
            items = results.len(),
            removed = count(RevertStatus::Removed),
            failed = count(RevertStatus::Failed),
            records_reverted,
            "Revert complete",
        );
        self.emit(
            SuppressionEvent::new(event_types::REVERTED).with_payload(serde_json::json!({
                "configured": configured,
                "items": results.len(),
                "removed": count(RevertStatus::Removed),
                "dryRun": count(RevertStatus::DryRun),
                "failed": count(RevertStatus::Failed),
                "unresolved": count(RevertStatus::Unresolved),
                "recordsReverted": records_reverted,
                "results": &results,
            })),
        );

        Ok(RevertOutcome {
            configured,
            results,
            records_reverted,
        })
    }

    /// Match each item to active records and a provider campaign.
    ///
    /// A matching record supplies the provider id it was written with;
    /// items without one go through the resolver.
    async fn plan_revert(
        &self,
        items: Vec<RecordRef>,
        configured: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<Planned>, SuppressionError> {
        let records = self.ledger.list_all().await?;
        let mut plan: Vec<Planned> = items
            .into_iter()
            .map(|item| {
                let matched = select_active(&records, Some(std::slice::from_ref(&item)));
                Planned {
                    provider_id: matched.first().map(|&i| records[i].campaign_id.clone()),
                    record_ids: matched.iter().map(|&i| records[i].id).collect(),
                    item,
                }
            })
            .collect();

        if !configured {
            return Ok(plan);
        }

        let pending: Vec<usize> = (0..plan.len())
            .filter(|&i| plan[i].provider_id.is_none())
            .collect();
        if pending.is_empty() {
            return Ok(plan);
        }

        let refs: Vec<CampaignRef> = pending
            .iter()
            .map(|&i| CampaignRef::new(plan[i].item.campaign_id.trim()))
            .collect();
        let table = self.mappings.table().await?;
        let batch = resolve_batch(
            &refs,
            &table,
            self.gateway.as_ref(),
            self.settings.call_timeout,
            cancel,
        )
        .await;
        for (i, resolved) in pending.into_iter().zip(batch.campaigns) {
            plan[i].provider_id = resolved.resolution.provider_id().map(str::to_string);
        }
        Ok(plan)
    }
}
