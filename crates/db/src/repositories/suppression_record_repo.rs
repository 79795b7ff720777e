//! Repository for the `suppression_records` table.

use sqlx::PgPool;
use zoneguard_core::suppression::{RevertUpdate, SuppressionRecord, VerificationUpdate};

use crate::models::suppression_record::SuppressionRecordRow;

/// Column list for `suppression_records` queries.
const COLUMNS: &str = "\
    id, campaign_id, local_campaign_id, zone_id, provider, observed_at, \
    synced, verified, verified_at, reverted, reverted_at, revert_confirmed";

/// Provides query operations for the suppression ledger.
pub struct SuppressionRecordRepo;

impl SuppressionRecordRepo {
    /// All records, newest observation first, insertion order within a batch.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<SuppressionRecordRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM suppression_records \
             ORDER BY observed_at DESC, seq ASC"
        );
        sqlx::query_as::<_, SuppressionRecordRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Insert a batch in one transaction.
    ///
    /// A record whose `(campaign_id, zone_id)` is held by an active row hits
    /// the partial unique index and is skipped. Only inserted rows are
    /// returned.
    pub async fn insert_batch(
        pool: &PgPool,
        records: &[SuppressionRecord],
    ) -> Result<Vec<SuppressionRecordRow>, sqlx::Error> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "INSERT INTO suppression_records \
                (id, campaign_id, local_campaign_id, zone_id, provider, observed_at, \
                 synced, verified, verified_at, reverted, reverted_at, revert_confirmed) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (campaign_id, zone_id) WHERE NOT reverted DO NOTHING \
             RETURNING {COLUMNS}"
        );

        let mut tx = pool.begin().await?;
        let mut inserted = Vec::with_capacity(records.len());
        for record in records {
            let row = sqlx::query_as::<_, SuppressionRecordRow>(&query)
                .bind(record.id)
                .bind(&record.campaign_id)
                .bind(&record.local_campaign_id)
                .bind(&record.zone_id)
                .bind(&record.provider)
                .bind(record.observed_at)
                .bind(record.synced)
                .bind(record.verified)
                .bind(record.verified_at)
                .bind(record.reverted)
                .bind(record.reverted_at)
                .bind(record.revert_confirmed)
                .fetch_optional(&mut *tx)
                .await?;
            inserted.extend(row);
        }
        tx.commit().await?;
        Ok(inserted)
    }

    /// Write verification results. Reverted rows are never touched.
    ///
    /// Returns the number of rows updated.
    pub async fn record_verification(
        pool: &PgPool,
        updates: &[VerificationUpdate],
    ) -> Result<u64, sqlx::Error> {
        if updates.is_empty() {
            return Ok(0);
        }

        let ids: Vec<_> = updates.iter().map(|u| u.id).collect();
        let verified: Vec<bool> = updates.iter().map(|u| u.verified).collect();
        let verified_at: Vec<_> = updates.iter().map(|u| u.verified_at).collect();

        let result = sqlx::query(
            "UPDATE suppression_records AS s \
             SET verified = u.verified, verified_at = u.verified_at, updated_at = NOW() \
             FROM UNNEST($1::uuid[], $2::bool[], $3::timestamptz[]) \
                  AS u(id, verified, verified_at) \
             WHERE s.id = u.id AND NOT s.reverted",
        )
        .bind(&ids)
        .bind(&verified)
        .bind(&verified_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Mark rows reverted. Rows already reverted keep their first revert.
    ///
    /// Returns the number of rows updated.
    pub async fn mark_reverted(
        pool: &PgPool,
        updates: &[RevertUpdate],
    ) -> Result<u64, sqlx::Error> {
        if updates.is_empty() {
            return Ok(0);
        }

        let ids: Vec<_> = updates.iter().map(|u| u.id).collect();
        let confirmed: Vec<bool> = updates.iter().map(|u| u.confirmed).collect();
        let reverted_at: Vec<_> = updates.iter().map(|u| u.reverted_at).collect();

        let result = sqlx::query(
            "UPDATE suppression_records AS s \
             SET reverted = TRUE, reverted_at = u.reverted_at, \
                 revert_confirmed = u.confirmed, updated_at = NOW() \
             FROM UNNEST($1::uuid[], $2::bool[], $3::timestamptz[]) \
                  AS u(id, confirmed, reverted_at) \
             WHERE s.id = u.id AND NOT s.reverted",
        )
        .bind(&ids)
        .bind(&confirmed)
        .bind(&reverted_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
