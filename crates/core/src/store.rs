//! Storage seams for the ledger and the mapping table.
//!
//! Postgres implementations live in `zoneguard-db`; in-memory ones (tests and
//! database-less development) in `zoneguard-suppression`.
//!
//! The ledger is a keyed store, not a rewritable list: inserts skip any
//! record whose `(campaign_id, zone_id)` is held by an active record, and
//! verify/revert write only their own columns, addressed by record id.
//! Concurrent sync, verify and revert runs cannot overwrite each other.

use async_trait::async_trait;
use serde::Serialize;

use crate::campaign_identity::{MappingTable, MappingTarget};
use crate::suppression::{RevertUpdate, SuppressionRecord, VerificationUpdate};
use crate::types::Timestamp;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A persisted row could not be mapped back to a domain value.
    #[error("Corrupt stored value: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait SuppressionLedger: Send + Sync {
    /// Short backend label for health reporting.
    fn backend(&self) -> &'static str;

    /// Reachability probe for health reporting.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Every record, newest batch first, insertion order within a batch.
    async fn list_all(&self) -> Result<Vec<SuppressionRecord>, StoreError>;

    /// Insert a batch atomically.
    ///
    /// Records whose key is already held by an active record are skipped.
    /// Returns the records actually inserted.
    async fn append(
        &self,
        records: Vec<SuppressionRecord>,
    ) -> Result<Vec<SuppressionRecord>, StoreError>;

    /// Store verification results. Reverted records are left untouched.
    ///
    /// Returns the number of records updated.
    async fn record_verification(
        &self,
        updates: &[VerificationUpdate],
    ) -> Result<usize, StoreError>;

    /// Mark records reverted. Records already reverted are left untouched.
    ///
    /// Returns the number of records updated.
    async fn mark_reverted(&self, updates: &[RevertUpdate]) -> Result<usize, StoreError>;
}

/// One row of the manual override table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignMapping {
    /// Local campaign id or display name.
    pub key: String,
    pub target: MappingTarget,
    pub display_name: Option<String>,
    pub updated_at: Timestamp,
}

#[async_trait]
pub trait MappingStore: Send + Sync {
    async fn list(&self) -> Result<Vec<CampaignMapping>, StoreError>;

    async fn upsert(
        &self,
        key: &str,
        target: &MappingTarget,
        display_name: Option<&str>,
    ) -> Result<CampaignMapping, StoreError>;

    /// Returns `false` when no mapping existed for `key`.
    async fn remove(&self, key: &str) -> Result<bool, StoreError>;

    /// Snapshot of the table for one resolution batch.
    async fn table(&self) -> Result<MappingTable, StoreError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .map(|m| (m.key, m.target))
            .collect())
    }
}
