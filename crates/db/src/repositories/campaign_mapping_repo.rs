//! Repository for the `campaign_mappings` table.

use sqlx::PgPool;
use zoneguard_core::campaign_identity::MappingTarget;

use crate::models::campaign_mapping::{target_columns, CampaignMappingRow};

/// Column list for `campaign_mappings` queries.
const COLUMNS: &str = "key, provider_id, ignored, display_name, updated_at";

/// Provides query operations for manual campaign overrides.
pub struct CampaignMappingRepo;

impl CampaignMappingRepo {
    /// All mappings ordered by key.
    pub async fn list(pool: &PgPool) -> Result<Vec<CampaignMappingRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM campaign_mappings ORDER BY key");
        sqlx::query_as::<_, CampaignMappingRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Insert or replace the mapping for `key`.
    pub async fn upsert(
        pool: &PgPool,
        key: &str,
        target: &MappingTarget,
        display_name: Option<&str>,
    ) -> Result<CampaignMappingRow, sqlx::Error> {
        let (provider_id, ignored) = target_columns(target);
        let query = format!(
            "INSERT INTO campaign_mappings (key, provider_id, ignored, display_name) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (key) DO UPDATE SET \
                provider_id = EXCLUDED.provider_id, \
                ignored = EXCLUDED.ignored, \
                display_name = COALESCE(EXCLUDED.display_name, campaign_mappings.display_name), \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CampaignMappingRow>(&query)
            .bind(key)
            .bind(provider_id)
            .bind(ignored)
            .bind(display_name)
            .fetch_one(pool)
            .await
    }

    /// Delete the mapping for `key`.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, key: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM campaign_mappings WHERE key = $1")
            .bind(key)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
