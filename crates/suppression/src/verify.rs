//! Re-check ledger entries against the provider's live exclusions.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use zoneguard_core::campaign_identity::CampaignRef;
use zoneguard_core::suppression::{select_active, RecordRef, VerificationUpdate};
use zoneguard_events::{event_types, SuppressionEvent};

use crate::calls::fetch_excluded;
use crate::error::SuppressionError;
use crate::resolution::resolve_batch;
use crate::Suppressor;

#[derive(Debug, Clone, Default)]
pub struct VerifyRequest {
    /// Records to check; `None` checks every active record.
    pub items: Option<Vec<RecordRef>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CampaignCounts {
    /// Groups whose exclusions were fetched.
    pub processed: usize,
    /// Groups left untouched: unresolvable or the fetch failed.
    pub skipped: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryCounts {
    pub checked: usize,
    pub verified_true: usize,
    pub verified_false: usize,
    /// Records whose verified flag changed.
    pub drifted: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyOutcome {
    pub configured: bool,
    pub cancelled: bool,
    pub campaigns: CampaignCounts,
    pub entries: EntryCounts,
}

impl Suppressor {
    pub async fn verify(
        &self,
        request: VerifyRequest,
        cancel: &CancellationToken,
    ) -> Result<VerifyOutcome, SuppressionError> {
        if !self.gateway.is_configured() {
            tracing::info!("Provider not configured, verify skipped");
            return Ok(VerifyOutcome::default());
        }

        let records = self.ledger.list_all().await?;
        let selected = select_active(&records, request.items.as_deref());

        // Campaign id as stored -> record indices.
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for &i in &selected {
            groups
                .entry(records[i].campaign_id.as_str())
                .or_default()
                .push(i);
        }

        let refs: Vec<CampaignRef> = groups.keys().map(|id| CampaignRef::new(*id)).collect();
        let table = self.mappings.table().await?;
        let batch = resolve_batch(
            &refs,
            &table,
            self.gateway.as_ref(),
            self.settings.call_timeout,
            cancel,
        )
        .await;

        // Provider id -> stored campaign ids that resolved to it.
        let mut targets: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for resolved in &batch.campaigns {
            if let Some(provider_id) = resolved.resolution.provider_id() {
                targets
                    .entry(provider_id.to_string())
                    .or_default()
                    .push(resolved.reference.id.as_str());
            }
        }

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
        let mut campaigns = CampaignCounts {
            total: groups.len(),
            ..CampaignCounts::default()
        };
        let mut entries = EntryCounts::default();
        let mut updates = Vec::new();

        for (provider_id, result) in fetched {
            let provider_id = provider_id.as_str();
            let stored_ids = &targets[provider_id];
            let excluded: BTreeSet<String> = match result {
                Ok(excluded) => excluded.zones,
                Err(e) => {
                    tracing::warn!(campaign_id = provider_id, error = %e, "Verify skipped campaign");
                    continue;
                }
            };
            campaigns.processed += stored_ids.len();

            for stored_id in stored_ids {
                for &i in &groups[stored_id] {
                    let record = &records[i];
                    let present = excluded.contains(&record.zone_id);
                    entries.checked += 1;
                    if present {
                        entries.verified_true += 1;
                    } else {
                        entries.verified_false += 1;
                    }
                    if present != record.verified {
                        entries.drifted += 1;
                        tracing::warn!(
                            record_id = %record.id,
                            campaign_id = %record.campaign_id,
                            zone_id = %record.zone_id,
                            was = record.verified,
                            now = present,
                            "Suppression drift detected",
                        );
                    }
                    updates.push(VerificationUpdate {
                        id: record.id,
                        verified: present,
                        verified_at: now,
                    });
                }
            }
        }
        campaigns.skipped = campaigns.total - campaigns.processed;

        let mut outcome = VerifyOutcome {
            configured: true,
            cancelled: false,
            campaigns,
            entries,
        };
        if cancel.is_cancelled() {
            tracing::info!("Verify cancelled, ledger not written");
            outcome.cancelled = true;
            return Ok(outcome);
        }

        if !updates.is_empty() {
            self.ledger.record_verification(&updates).await?;
        }

        tracing::info!(
            processed = campaigns.processed,
            skipped = campaigns.skipped,
            checked = entries.checked,
            drifted = entries.drifted,
            "Verify complete",
        );
        self.emit(
            SuppressionEvent::new(event_types::VERIFY_COMPLETED).with_payload(serde_json::json!({
                "campaigns": campaigns,
                "entries": entries,
            })),
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use zoneguard_core::store::SuppressionLedger;
    use zoneguard_core::suppression::SuppressionRecord;
    use zoneguard_core::gateway::GatewayError;

    use super::*;
    use crate::memory::InMemoryLedger;
    use crate::testing::{harness, harness_with, FakeGateway, FakeReporting};

    fn seeded(records: &[(&str, &str)]) -> InMemoryLedger {
        InMemoryLedger::with_records(
            records
                .iter()
                .map(|(c, z)| SuppressionRecord::observed(*c, None, *z, "fake", Utc::now()))
                .collect(),
        )
    }

    fn reference(campaign: &str, zone: &str) -> RecordRef {
        RecordRef {
            id: None,
            campaign_id: campaign.into(),
            zone_id: zone.into(),
        }
    }

    #[tokio::test]
    async fn zone_missing_at_provider_is_marked_unverified() {
        let h = harness_with(
            FakeGateway::configured().with_zones("7001", &["A", "B"]),
            FakeReporting::default(),
            seeded(&[("7001", "A"), ("7001", "B"), ("7001", "C")]),
        );

        let outcome = h
            .suppressor
            .verify(VerifyRequest::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcome.campaigns,
            CampaignCounts {
                processed: 1,
                skipped: 0,
                total: 1
            }
        );
        assert_eq!(
            outcome.entries,
            EntryCounts {
                checked: 3,
                verified_true: 2,
                verified_false: 1,
                drifted: 1
            }
        );
        let stored = h.ledger.list_all().await.unwrap();
        let c = stored.iter().find(|r| r.zone_id == "C").unwrap();
        assert!(!c.verified && !c.reverted);
        assert!(stored.iter().filter(|r| r.zone_id != "C").all(|r| r.verified));
    }

    #[tokio::test]
    async fn zone_reappearing_drifts_back() {
        let h = harness_with(
            FakeGateway::configured().with_zones("7001", &["A"]),
            FakeReporting::default(),
            seeded(&[("7001", "A"), ("7001", "B")]),
        );
        let cancel = CancellationToken::new();
        h.suppressor.verify(VerifyRequest::default(), &cancel).await.unwrap();

        h.gateway.set_zones("7001", &["A", "B"]);
        let outcome = h.suppressor.verify(VerifyRequest::default(), &cancel).await.unwrap();
        assert_eq!(outcome.entries.drifted, 1);
        assert_eq!(outcome.entries.verified_true, 2);
    }

    #[tokio::test]
    async fn failed_campaign_is_skipped_and_untouched() {
        let h = harness_with(
            FakeGateway::configured()
                .with_zones("7001", &[])
                .failing_fetch(
                    "7002",
                    GatewayError::Malformed {
                        status: 200,
                        body: "<html>".into(),
                    },
                ),
            FakeReporting::default(),
            seeded(&[("7001", "A"), ("7002", "B")]),
        );
        let outcome = h
            .suppressor
            .verify(VerifyRequest::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.campaigns.processed, 1);
        assert_eq!(outcome.campaigns.skipped, 1);
        assert_eq!(outcome.entries.checked, 1);
        let stored = h.ledger.list_all().await.unwrap();
        let b = stored.iter().find(|r| r.zone_id == "B").unwrap();
        assert!(b.verified);
    }

    #[tokio::test]
    async fn unresolvable_stored_campaign_is_skipped() {
        let h = harness_with(
            FakeGateway::configured(),
            FakeReporting::default(),
            seeded(&[("legacy-name", "A")]),
        );
        let outcome = h
            .suppressor
            .verify(VerifyRequest::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.campaigns.skipped, 1);
        assert_eq!(h.gateway.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn explicit_items_limit_the_check() {
        let h = harness_with(
            FakeGateway::configured().with_zones("7001", &[]),
            FakeReporting::default(),
            seeded(&[("7001", "A"), ("7001", "B")]),
        );
        let request = VerifyRequest {
            items: Some(vec![reference("7001", "B")]),
        };
        let outcome = h
            .suppressor
            .verify(request, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.entries.checked, 1);

        let stored = h.ledger.list_all().await.unwrap();
        assert!(stored.iter().find(|r| r.zone_id == "A").unwrap().verified);
        assert!(!stored.iter().find(|r| r.zone_id == "B").unwrap().verified);
    }

    #[tokio::test]
    async fn reverted_records_are_not_checked() {
        let mut reverted = SuppressionRecord::observed("7001", None, "A", "fake", Utc::now());
        reverted.mark_reverted(true, Utc::now());
        let h = harness_with(
            FakeGateway::configured().with_zones("7001", &[]),
            FakeReporting::default(),
            InMemoryLedger::with_records(vec![reverted]),
        );
        let outcome = h
            .suppressor
            .verify(VerifyRequest::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.campaigns.total, 0);
        assert_eq!(h.gateway.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn unconfigured_provider_reports_not_configured() {
        let h = harness(FakeGateway::unconfigured());
        let outcome = h
            .suppressor
            .verify(VerifyRequest::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(!outcome.configured);
    }

    #[tokio::test]
    async fn verify_runs_on_a_spawned_task() {
        let h = harness_with(
            FakeGateway::configured().with_zones("7001", &["A"]),
            FakeReporting::default(),
            seeded(&[("7001", "A"), ("7001", "B")]),
        );
        let suppressor = h.suppressor.clone();
        let cancel = CancellationToken::new();

        let outcome = tokio::spawn(async move {
            suppressor
                .verify(VerifyRequest { items: None }, &cancel)
                .await
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(outcome.entries.checked, 2);
        assert_eq!(outcome.entries.verified_true, 1);
    }
}
