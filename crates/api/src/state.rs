use std::sync::Arc;

use zoneguard_suppression::Suppressor;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: every collaborator sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Ledger, mapping store, provider gateway, reporting source and event
    /// bus, plus fan-out settings.
    pub suppressor: Suppressor,
}
