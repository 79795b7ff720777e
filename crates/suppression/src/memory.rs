//! In-memory stores for tests and database-less development.
//!
//! Same contracts as the Postgres stores: `append` skips keys held by active
//! records, updates address records by id and never touch reverted ones.
//! Contents are lost on restart.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use zoneguard_core::campaign_identity::MappingTarget;
use zoneguard_core::store::{CampaignMapping, MappingStore, StoreError, SuppressionLedger};
use zoneguard_core::suppression::{
    active_keys, RevertUpdate, SuppressionRecord, VerificationUpdate,
};

#[derive(Default)]
pub struct InMemoryLedger {
    records: RwLock<Vec<SuppressionRecord>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a ledger with existing records, kept in the given order.
    pub fn with_records(records: Vec<SuppressionRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait]
impl SuppressionLedger for InMemoryLedger {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list_all(&self) -> Result<Vec<SuppressionRecord>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn append(
        &self,
        records: Vec<SuppressionRecord>,
    ) -> Result<Vec<SuppressionRecord>, StoreError> {
        let mut stored = self.records.write().await;
        let mut held = active_keys(&stored);

        let inserted: Vec<SuppressionRecord> = records
            .into_iter()
            .filter(|r| !r.is_active() || held.insert(r.key()))
            .collect();

        stored.splice(0..0, inserted.iter().cloned());
        Ok(inserted)
    }

    async fn record_verification(
        &self,
        updates: &[VerificationUpdate],
    ) -> Result<usize, StoreError> {
        let by_id: HashMap<_, _> = updates.iter().map(|u| (u.id, u)).collect();
        let mut stored = self.records.write().await;
        let mut updated = 0;
        for record in stored.iter_mut().filter(|r| r.is_active()) {
            if let Some(update) = by_id.get(&record.id) {
                record.mark_verified(update.verified, update.verified_at);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn mark_reverted(&self, updates: &[RevertUpdate]) -> Result<usize, StoreError> {
        let by_id: HashMap<_, _> = updates.iter().map(|u| (u.id, u)).collect();
        let mut stored = self.records.write().await;
        let mut updated = 0;
        for record in stored.iter_mut().filter(|r| r.is_active()) {
            if let Some(update) = by_id.get(&record.id) {
                record.mark_reverted(update.confirmed, update.reverted_at);
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[derive(Default)]
pub struct InMemoryMappingStore {
    mappings: RwLock<BTreeMap<String, CampaignMapping>>,
}

impl InMemoryMappingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MappingStore for InMemoryMappingStore {
    async fn list(&self) -> Result<Vec<CampaignMapping>, StoreError> {
        Ok(self.mappings.read().await.values().cloned().collect())
    }

    async fn upsert(
        &self,
        key: &str,
        target: &MappingTarget,
        display_name: Option<&str>,
    ) -> Result<CampaignMapping, StoreError> {
        let mut mappings = self.mappings.write().await;
        let display_name = display_name
            .map(str::to_string)
            .or_else(|| mappings.get(key).and_then(|m| m.display_name.clone()));
        let mapping = CampaignMapping {
            key: key.to_string(),
            target: target.clone(),
            display_name,
            updated_at: Utc::now(),
        };
        mappings.insert(key.to_string(), mapping.clone());
        Ok(mapping)
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.mappings.write().await.remove(key).is_some())
    }
}
