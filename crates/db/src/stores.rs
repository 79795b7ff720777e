//! Postgres implementations of the core storage seams.

use async_trait::async_trait;
use zoneguard_core::campaign_identity::MappingTarget;
use zoneguard_core::store::{CampaignMapping, MappingStore, StoreError, SuppressionLedger};
use zoneguard_core::suppression::{RevertUpdate, SuppressionRecord, VerificationUpdate};

use crate::repositories::{CampaignMappingRepo, SuppressionRecordRepo};
use crate::DbPool;

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(Box::new(err))
}

/// Ledger backed by `suppression_records`.
#[derive(Clone)]
pub struct PgSuppressionLedger {
    pool: DbPool,
}

impl PgSuppressionLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SuppressionLedger for PgSuppressionLedger {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await.map_err(backend)
    }

    async fn list_all(&self) -> Result<Vec<SuppressionRecord>, StoreError> {
        let rows = SuppressionRecordRepo::list_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(SuppressionRecord::from).collect())
    }

    async fn append(
        &self,
        records: Vec<SuppressionRecord>,
    ) -> Result<Vec<SuppressionRecord>, StoreError> {
        let rows = SuppressionRecordRepo::insert_batch(&self.pool, &records)
            .await
            .map_err(backend)?;
        let inserted = rows.len();
        if inserted < records.len() {
            tracing::debug!(
                requested = records.len(),
                inserted,
                "Skipped records already held by active suppressions",
            );
        }
        Ok(rows.into_iter().map(SuppressionRecord::from).collect())
    }

    async fn record_verification(
        &self,
        updates: &[VerificationUpdate],
    ) -> Result<usize, StoreError> {
        let n = SuppressionRecordRepo::record_verification(&self.pool, updates)
            .await
            .map_err(backend)?;
        Ok(n as usize)
    }

    async fn mark_reverted(&self, updates: &[RevertUpdate]) -> Result<usize, StoreError> {
        let n = SuppressionRecordRepo::mark_reverted(&self.pool, updates)
            .await
            .map_err(backend)?;
        Ok(n as usize)
    }
}

/// Mapping table backed by `campaign_mappings`.
#[derive(Clone)]
pub struct PgMappingStore {
    pool: DbPool,
}

impl PgMappingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MappingStore for PgMappingStore {
    async fn list(&self) -> Result<Vec<CampaignMapping>, StoreError> {
        CampaignMappingRepo::list(&self.pool)
            .await
            .map_err(backend)?
            .into_iter()
            .map(CampaignMapping::try_from)
            .collect()
    }

    async fn upsert(
        &self,
        key: &str,
        target: &MappingTarget,
        display_name: Option<&str>,
    ) -> Result<CampaignMapping, StoreError> {
        let row = CampaignMappingRepo::upsert(&self.pool, key, target, display_name)
            .await
            .map_err(backend)?;
        CampaignMapping::try_from(row)
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        CampaignMappingRepo::delete(&self.pool, key)
            .await
            .map_err(backend)
    }
}
