//! Suppression orchestrators.
//!
//! [`Suppressor`] ties the ledger, the mapping table and the provider
//! gateway together and exposes the four operations the HTTP layer serves:
//! [`sync`](Suppressor::sync), [`verify`](Suppressor::verify),
//! [`revert`](Suppressor::revert) and [`preview`](Suppressor::preview).
//!
//! Every operation is one unit of work. Provider calls fan out on a bounded
//! pool, each under its own timeout, and stop early when the caller's
//! [`CancellationToken`](tokio_util::sync::CancellationToken) fires.

mod calls;
pub mod error;
pub mod memory;
pub mod preview;
pub mod resolution;
pub mod revert;
pub mod settings;
pub mod sync;
pub mod verify;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use zoneguard_core::gateway::{ProviderGateway, ReportingSource};
use zoneguard_core::store::{MappingStore, SuppressionLedger};
use zoneguard_events::{EventBus, SuppressionEvent};

pub use error::SuppressionError;
pub use memory::{InMemoryLedger, InMemoryMappingStore};
pub use settings::SuppressionSettings;

/// Shared handles the orchestrators work with.
#[derive(Clone)]
pub struct Suppressor {
    pub ledger: Arc<dyn SuppressionLedger>,
    pub mappings: Arc<dyn MappingStore>,
    pub gateway: Arc<dyn ProviderGateway>,
    pub reporting: Arc<dyn ReportingSource>,
    pub events: Arc<EventBus>,
    pub settings: SuppressionSettings,
}

impl Suppressor {
    fn emit(&self, event: SuppressionEvent) {
        self.events.publish(event);
    }
}
