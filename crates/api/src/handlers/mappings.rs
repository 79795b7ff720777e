//! Handlers for the manual campaign mapping table.
//!
//! A mapping pins a local campaign id (or display name) to a provider
//! campaign id, or marks it `"ignore"` so resolution never runs for it.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;
use zoneguard_core::campaign_identity::MappingTarget;
use zoneguard_core::error::CoreError;
use zoneguard_core::store::CampaignMapping;
use zoneguard_core::types::Timestamp;
use zoneguard_events::{event_types, SuppressionEvent};

use super::id_string;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

const ENTITY: &str = "campaign_mapping";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertMapping {
    #[serde(alias = "dashboardId", deserialize_with = "id_string")]
    #[validate(length(min = 1, max = 256))]
    pub key: String,
    /// Provider campaign id, or `"ignore"`.
    #[serde(alias = "value", deserialize_with = "id_string")]
    #[validate(length(min = 1, max = 128))]
    pub provider_id: String,
    #[serde(default, alias = "dashboardName")]
    #[validate(length(max = 256))]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteMappingQuery {
    pub key: Option<String>,
}

/// Wire form of a mapping: the target flattened back to its string.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingView {
    pub key: String,
    pub provider_id: String,
    pub ignored: bool,
    pub display_name: Option<String>,
    pub updated_at: Timestamp,
}

impl From<CampaignMapping> for MappingView {
    fn from(mapping: CampaignMapping) -> Self {
        Self {
            provider_id: mapping.target.as_wire().to_string(),
            ignored: mapping.target == MappingTarget::Ignored,
            key: mapping.key,
            display_name: mapping.display_name,
            updated_at: mapping.updated_at,
        }
    }
}

/// GET /api/v1/suppression/mappings
pub async fn list_mappings(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<MappingView>>>> {
    let mappings = state.suppressor.mappings.list().await?;

    Ok(Json(DataResponse {
        data: mappings.into_iter().map(MappingView::from).collect(),
    }))
}

/// POST /api/v1/suppression/mappings
///
/// Create or replace the mapping for `key`. An omitted display name keeps
/// the stored one.
pub async fn upsert_mapping(
    State(state): State<AppState>,
    Json(input): Json<UpsertMapping>,
) -> AppResult<Json<DataResponse<MappingView>>> {
    input.validate()?;

    let key = input.key.trim();
    let target = MappingTarget::parse(&input.provider_id)?;
    let display_name = input
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let mapping = state
        .suppressor
        .mappings
        .upsert(key, &target, display_name)
        .await?;

    state.suppressor.events.publish(
        SuppressionEvent::new(event_types::MAPPING_UPDATED)
            .with_source(ENTITY, key)
            .with_payload(serde_json::json!({ "providerId": target.as_wire() })),
    );
    tracing::info!(key, provider_id = target.as_wire(), "Campaign mapping saved");

    Ok(Json(DataResponse {
        data: mapping.into(),
    }))
}

/// DELETE /api/v1/suppression/mappings/{key}
pub async fn delete_mapping(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<StatusCode> {
    remove(&state, &key).await
}

/// DELETE /api/v1/suppression/mappings?key=
pub async fn delete_mapping_by_query(
    State(state): State<AppState>,
    Query(params): Query<DeleteMappingQuery>,
) -> AppResult<StatusCode> {
    let key = params
        .key
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Query parameter 'key' is required".into()))?;
    remove(&state, &key).await
}

async fn remove(state: &AppState, key: &str) -> AppResult<StatusCode> {
    let key = key.trim();
    if !state.suppressor.mappings.remove(key).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "CampaignMapping",
            id: key.to_string(),
        }));
    }

    state
        .suppressor
        .events
        .publish(SuppressionEvent::new(event_types::MAPPING_REMOVED).with_source(ENTITY, key));
    tracing::info!(key, "Campaign mapping removed");

    Ok(StatusCode::NO_CONTENT)
}
