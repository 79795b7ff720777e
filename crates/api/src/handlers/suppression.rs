//! Handlers for the sync, verify and revert workflows and the ledger listing.
//!
//! Missing provider credentials are not an error: the orchestrators report
//! `configured: false` and the response carries `ok: false` with HTTP 200.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use validator::Validate;
use zoneguard_core::campaign_identity::CampaignRef;
use zoneguard_core::suppression::{RecordRef, SuppressionRecord};
use zoneguard_suppression::revert::{RevertItemResult, RevertOutcome};
use zoneguard_suppression::sync::{SyncDiagnostic, SyncOutcome, SyncRequest};
use zoneguard_suppression::verify::{CampaignCounts, EntryCounts, VerifyOutcome, VerifyRequest};

use super::{id_string, opt_id_string};
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

const NOT_CONFIGURED: &str = "Provider credentials are not configured";

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// A campaign reference: a bare id or `{ id, name }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CampaignInput {
    Ref(CampaignRefInput),
    Id(#[serde(deserialize_with = "id_string")] String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignRefInput {
    #[serde(alias = "campaignId", deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<CampaignInput> for CampaignRef {
    fn from(input: CampaignInput) -> Self {
        match input {
            CampaignInput::Id(id) => CampaignRef::new(id),
            CampaignInput::Ref(CampaignRefInput { id, name }) => CampaignRef {
                id,
                name: name.filter(|n| !n.trim().is_empty()),
            },
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SyncBody {
    /// Explicit campaigns; omitted or empty derives them from reporting.
    #[serde(default)]
    #[validate(length(max = 500))]
    pub campaign_ids: Option<Vec<CampaignInput>>,
    #[validate(length(min = 1, max = 64))]
    pub date_range: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
}

impl SyncBody {
    fn into_request(self) -> SyncRequest {
        let campaigns = self
            .campaign_ids
            .map(|ids| ids.into_iter().map(CampaignRef::from).collect::<Vec<_>>())
            .filter(|refs| !refs.is_empty());
        SyncRequest {
            campaigns,
            date_range: self.date_range,
            dry_run: self.dry_run,
        }
    }
}

/// Query form of [`SyncBody`]: `campaignIds` is comma-separated.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SyncQuery {
    #[validate(length(max = 8192))]
    pub campaign_ids: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub date_range: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
}

impl SyncQuery {
    fn into_request(self) -> SyncRequest {
        let campaigns = self
            .campaign_ids
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(CampaignRef::new)
                    .collect::<Vec<_>>()
            })
            .filter(|refs| !refs.is_empty());
        SyncRequest {
            campaigns,
            date_range: self.date_range,
            dry_run: self.dry_run,
        }
    }
}

/// Pointer at a ledger entry: by record id, or by campaign and zone.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordRefInput {
    #[serde(default, deserialize_with = "opt_id_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "id_string")]
    #[validate(length(min = 1, max = 128))]
    pub campaign_id: String,
    #[serde(deserialize_with = "id_string")]
    #[validate(length(min = 1, max = 128))]
    pub zone_id: String,
}

impl From<RecordRefInput> for RecordRef {
    fn from(input: RecordRefInput) -> Self {
        RecordRef {
            id: input.id,
            campaign_id: input.campaign_id,
            zone_id: input.zone_id,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct VerifyBody {
    /// Entries to check; omitted checks every active record.
    #[validate(length(max = 10000))]
    pub items: Option<Vec<RecordRefInput>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RevertBody {
    #[serde(default)]
    #[validate(length(min = 1, max = 1000))]
    pub items: Vec<RecordRefInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerQuery {
    /// Include reverted records (default: `true`).
    pub include_reverted: Option<bool>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub ok: bool,
    pub configured: bool,
    pub dry_run: bool,
    pub cancelled: bool,
    /// Distinct provider campaigns resolved.
    pub campaigns: usize,
    pub ignored: usize,
    pub added: usize,
    pub diagnostics: Vec<SyncDiagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl From<SyncOutcome> for SyncResponse {
    fn from(outcome: SyncOutcome) -> Self {
        Self {
            ok: outcome.configured && !outcome.cancelled,
            configured: outcome.configured,
            dry_run: outcome.dry_run,
            cancelled: outcome.cancelled,
            campaigns: outcome.resolved_count,
            ignored: outcome.ignored_count,
            added: outcome.added_count,
            diagnostics: outcome.diagnostics,
            message: (!outcome.configured).then_some(NOT_CONFIGURED),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub ok: bool,
    pub configured: bool,
    pub cancelled: bool,
    pub campaigns: CampaignCounts,
    pub entries: EntryCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl From<VerifyOutcome> for VerifyResponse {
    fn from(outcome: VerifyOutcome) -> Self {
        Self {
            ok: outcome.configured && !outcome.cancelled,
            configured: outcome.configured,
            cancelled: outcome.cancelled,
            campaigns: outcome.campaigns,
            entries: outcome.entries,
            message: (!outcome.configured).then_some(NOT_CONFIGURED),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertResponse {
    /// Every item was removed at the provider.
    pub ok: bool,
    pub configured: bool,
    pub results: Vec<RevertItemResult>,
    pub records_reverted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl From<RevertOutcome> for RevertResponse {
    fn from(outcome: RevertOutcome) -> Self {
        Self {
            ok: outcome.configured && outcome.results.iter().all(|r| r.ok),
            configured: outcome.configured,
            message: (!outcome.configured).then_some(NOT_CONFIGURED),
            results: outcome.results,
            records_reverted: outcome.records_reverted,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn validate_items(items: &[RecordRefInput]) -> AppResult<()> {
    for item in items {
        item.validate()?;
    }
    Ok(())
}

/// POST /api/v1/suppression/sync
///
/// Import the provider's current exclusions for the given (or reporting
/// derived) campaigns into the ledger.
pub async fn sync(
    State(state): State<AppState>,
    Json(body): Json<SyncBody>,
) -> AppResult<Json<SyncResponse>> {
    body.validate()?;
    run_sync(&state, body.into_request()).await
}

/// GET /api/v1/suppression/sync?campaignIds=1,2&dateRange=&dryRun=
pub async fn sync_from_query(
    State(state): State<AppState>,
    Query(params): Query<SyncQuery>,
) -> AppResult<Json<SyncResponse>> {
    params.validate()?;
    run_sync(&state, params.into_request()).await
}

async fn run_sync(state: &AppState, request: SyncRequest) -> AppResult<Json<SyncResponse>> {
    // Dropping the handler (client gone or request timeout) stops the fan-out.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let outcome = state.suppressor.sync(request, &cancel).await?;

    tracing::info!(
        configured = outcome.configured,
        dry_run = outcome.dry_run,
        campaigns = outcome.resolved_count,
        added = outcome.added_count,
        "Suppression sync finished",
    );

    Ok(Json(outcome.into()))
}

/// POST /api/v1/suppression/verify
///
/// Re-check active ledger entries against the provider's live exclusions.
/// An empty body checks every active entry.
pub async fn verify(
    State(state): State<AppState>,
    body: Option<Json<VerifyBody>>,
) -> AppResult<Json<VerifyResponse>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    body.validate()?;
    validate_items(body.items.as_deref().unwrap_or_default())?;

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let request = VerifyRequest {
        items: body
            .items
            .map(|items| items.into_iter().map(RecordRef::from).collect()),
    };
    let outcome = state.suppressor.verify(request, &cancel).await?;

    tracing::info!(
        processed = outcome.campaigns.processed,
        skipped = outcome.campaigns.skipped,
        checked = outcome.entries.checked,
        drifted = outcome.entries.drifted,
        "Suppression verify finished",
    );

    Ok(Json(outcome.into()))
}

/// POST /api/v1/suppression/revert (also `/unblacklist`)
///
/// Remove exclusions at the provider and mark the matching records reverted.
pub async fn revert(
    State(state): State<AppState>,
    Json(body): Json<RevertBody>,
) -> AppResult<Json<RevertResponse>> {
    body.validate()?;
    validate_items(&body.items)?;

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let items = body.items.into_iter().map(RecordRef::from).collect();
    let outcome = state.suppressor.revert(items, &cancel).await?;

    tracing::info!(
        items = outcome.results.len(),
        records_reverted = outcome.records_reverted,
        "Suppression revert finished",
    );

    Ok(Json(outcome.into()))
}

/// GET /api/v1/suppression/ledger
///
/// Ledger records, newest first. `?includeReverted=false` hides history.
pub async fn list_ledger(
    State(state): State<AppState>,
    Query(params): Query<LedgerQuery>,
) -> AppResult<Json<DataResponse<Vec<SuppressionRecord>>>> {
    let mut records = state.suppressor.ledger.list_all().await?;
    if !params.include_reverted.unwrap_or(true) {
        records.retain(SuppressionRecord::is_active);
    }

    Ok(Json(DataResponse { data: records }))
}
