pub mod health;
pub mod suppression;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /suppression/sync                 import provider exclusions (GET, POST)
/// /suppression/verify               re-check ledger entries (POST)
/// /suppression/revert               remove exclusions at the provider (POST)
/// /suppression/unblacklist          alias of /revert (POST)
/// /suppression/preview              recommendations (POST)
/// /suppression/ledger               list ledger records (GET)
/// /suppression/mappings             list, upsert, delete by query
/// /suppression/mappings/{key}       delete one mapping
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/suppression", suppression::router())
}
