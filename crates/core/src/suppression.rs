//! Suppression ledger records and target selection.
//!
//! A record is created when a sync observes a zone excluded at the provider.
//! It is never deleted: verify flips `verified`, revert sets `reverted`.
//! Among records that are not reverted, `(campaign_id, zone_id)` is unique.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::{RecordId, Timestamp};

/// One observed provider-side zone exclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuppressionRecord {
    pub id: RecordId,
    /// Provider campaign id as resolved when the record was written.
    pub campaign_id: String,
    /// The reporting-side reference that resolved to `campaign_id`.
    pub local_campaign_id: Option<String>,
    pub zone_id: String,
    /// Tag of the ad network the exclusion lives at.
    pub provider: String,
    pub observed_at: Timestamp,
    pub synced: bool,
    pub verified: bool,
    pub verified_at: Option<Timestamp>,
    pub reverted: bool,
    pub reverted_at: Option<Timestamp>,
    /// The provider confirmed the removal (false for dry runs and failures).
    pub revert_confirmed: bool,
}

/// Identity of a suppression among active records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneKey {
    pub campaign_id: String,
    pub zone_id: String,
}

impl ZoneKey {
    pub fn new(campaign_id: impl Into<String>, zone_id: impl Into<String>) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            zone_id: zone_id.into(),
        }
    }
}

impl SuppressionRecord {
    /// A freshly observed exclusion: synced and verified by construction.
    pub fn observed(
        campaign_id: impl Into<String>,
        local_campaign_id: Option<String>,
        zone_id: impl Into<String>,
        provider: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            campaign_id: campaign_id.into(),
            local_campaign_id,
            zone_id: zone_id.into(),
            provider: provider.into(),
            observed_at: now,
            synced: true,
            verified: true,
            verified_at: Some(now),
            reverted: false,
            reverted_at: None,
            revert_confirmed: false,
        }
    }

    pub fn key(&self) -> ZoneKey {
        ZoneKey::new(self.campaign_id.clone(), self.zone_id.clone())
    }

    pub fn is_active(&self) -> bool {
        !self.reverted
    }

    /// Record a verification result. Returns `true` if the flag changed.
    pub fn mark_verified(&mut self, present: bool, at: Timestamp) -> bool {
        let changed = self.verified != present;
        self.verified = present;
        self.verified_at = Some(at);
        changed
    }

    pub fn mark_reverted(&mut self, confirmed: bool, at: Timestamp) {
        self.reverted = true;
        self.reverted_at = Some(at);
        self.revert_confirmed = confirmed;
    }
}

/// Verification result for one record, addressed by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationUpdate {
    pub id: RecordId,
    pub verified: bool,
    pub verified_at: Timestamp,
}

/// Revert transition for one record, addressed by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevertUpdate {
    pub id: RecordId,
    pub confirmed: bool,
    pub reverted_at: Timestamp,
}

/// Keys held by active records; the dedup set for a sync.
pub fn active_keys(records: &[SuppressionRecord]) -> HashSet<ZoneKey> {
    records
        .iter()
        .filter(|r| r.is_active())
        .map(SuppressionRecord::key)
        .collect()
}

/// Caller-supplied pointer at a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRef {
    #[serde(default)]
    pub id: Option<String>,
    pub campaign_id: String,
    pub zone_id: String,
}

impl RecordRef {
    /// Does `record` match this reference?
    ///
    /// An id, when given and known, identifies exactly one record. Otherwise
    /// the campaign (provider or local reference) and zone must match.
    fn matches(&self, record: &SuppressionRecord, id_known: bool) -> bool {
        if let (Some(id), true) = (&self.id, id_known) {
            return record.id.to_string() == *id;
        }
        record.zone_id == self.zone_id.trim()
            && (record.campaign_id == self.campaign_id.trim()
                || record.local_campaign_id.as_deref() == Some(self.campaign_id.trim()))
    }
}

/// Indices (ledger order) of the active records a request targets.
///
/// `None` selects every active record.
pub fn select_active(records: &[SuppressionRecord], refs: Option<&[RecordRef]>) -> Vec<usize> {
    let Some(refs) = refs else {
        return records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_active())
            .map(|(i, _)| i)
            .collect();
    };

    let known_ids: HashSet<String> = records.iter().map(|r| r.id.to_string()).collect();
    let mut selected = BTreeSet::new();
    for reference in refs {
        let id_known = reference.id.as_ref().is_some_and(|id| known_ids.contains(id));
        selected.extend(
            records
                .iter()
                .enumerate()
                .filter(|(_, r)| r.is_active() && reference.matches(r, id_known))
                .map(|(i, _)| i),
        );
    }
    selected.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
