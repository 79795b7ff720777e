use sqlx::FromRow;
use zoneguard_core::suppression::SuppressionRecord;
use zoneguard_core::types::{RecordId, Timestamp};

/// A row of `suppression_records`.
#[derive(Debug, Clone, FromRow)]
pub struct SuppressionRecordRow {
    pub id: RecordId,
    pub campaign_id: String,
    pub local_campaign_id: Option<String>,
    pub zone_id: String,
    pub provider: String,
    pub observed_at: Timestamp,
    pub synced: bool,
    pub verified: bool,
    pub verified_at: Option<Timestamp>,
    pub reverted: bool,
    pub reverted_at: Option<Timestamp>,
    pub revert_confirmed: bool,
}

impl From<SuppressionRecordRow> for SuppressionRecord {
    fn from(row: SuppressionRecordRow) -> Self {
        Self {
            id: row.id,
            campaign_id: row.campaign_id,
            local_campaign_id: row.local_campaign_id,
            zone_id: row.zone_id,
            provider: row.provider,
            observed_at: row.observed_at,
            synced: row.synced,
            verified: row.verified,
            verified_at: row.verified_at,
            reverted: row.reverted,
            reverted_at: row.reverted_at,
            revert_confirmed: row.revert_confirmed,
        }
    }
}
