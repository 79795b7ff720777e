//! Route definitions for the suppression workflow, mounted at `/suppression`.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{mappings, preview, suppression};
use crate::state::AppState;

/// ```text
/// GET    /sync              -> sync_from_query
/// POST   /sync              -> sync
/// POST   /verify            -> verify
/// POST   /revert            -> revert
/// POST   /unblacklist       -> revert
/// POST   /preview           -> preview
/// GET    /ledger            -> list_ledger
/// GET    /mappings          -> list_mappings
/// POST   /mappings          -> upsert_mapping
/// DELETE /mappings?key=     -> delete_mapping_by_query
/// DELETE /mappings/{key}    -> delete_mapping
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/sync",
            get(suppression::sync_from_query).post(suppression::sync),
        )
        .route("/verify", post(suppression::verify))
        .route("/revert", post(suppression::revert))
        .route("/unblacklist", post(suppression::revert))
        .route("/preview", post(preview::preview))
        .route("/ledger", get(suppression::list_ledger))
        .route(
            "/mappings",
            get(mappings::list_mappings)
                .post(mappings::upsert_mapping)
                .delete(mappings::delete_mapping_by_query),
        )
        .route("/mappings/{key}", delete(mappings::delete_mapping))
}
