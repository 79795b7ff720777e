use sqlx::FromRow;
use zoneguard_core::campaign_identity::MappingTarget;
use zoneguard_core::store::{CampaignMapping, StoreError};
use zoneguard_core::types::Timestamp;

/// A row of `campaign_mappings`.
///
/// `ignored` and `provider_id` are mutually exclusive (enforced by
/// `ck_campaign_mappings_target`).
#[derive(Debug, Clone, FromRow)]
pub struct CampaignMappingRow {
    pub key: String,
    pub provider_id: Option<String>,
    pub ignored: bool,
    pub display_name: Option<String>,
    pub updated_at: Timestamp,
}

impl TryFrom<CampaignMappingRow> for CampaignMapping {
    type Error = StoreError;

    fn try_from(row: CampaignMappingRow) -> Result<Self, Self::Error> {
        let target = match (row.ignored, row.provider_id) {
            (true, _) => MappingTarget::Ignored,
            (false, Some(id)) => MappingTarget::Mapped(id),
            (false, None) => {
                return Err(StoreError::Corrupt(format!(
                    "campaign mapping '{}' has neither provider id nor ignored flag",
                    row.key
                )))
            }
        };
        Ok(Self {
            key: row.key,
            target,
            display_name: row.display_name,
            updated_at: row.updated_at,
        })
    }
}

/// Split a target into the `(provider_id, ignored)` column pair.
pub fn target_columns(target: &MappingTarget) -> (Option<&str>, bool) {
    match target {
        MappingTarget::Mapped(id) => (Some(id.as_str()), false),
        MappingTarget::Ignored => (None, true),
    }
}
