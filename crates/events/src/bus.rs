//! In-process event bus for suppression operations.
//!
//! Orchestrators publish one [`SuppressionEvent`] per completed operation.
//! Publishing never blocks and never fails; with no subscriber the event is
//! dropped.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use zoneguard_core::types::Timestamp;

/// Event type names.
pub mod event_types {
    pub const SYNC_COMPLETED: &str = "suppression.synced";
    pub const VERIFY_COMPLETED: &str = "suppression.verified";
    pub const REVERTED: &str = "suppression.reverted";
    pub const MAPPING_UPDATED: &str = "mapping.updated";
    pub const MAPPING_REMOVED: &str = "mapping.removed";
}

/// Something that happened to the ledger or the mapping table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuppressionEvent {
    /// One of [`event_types`].
    pub event_type: String,
    /// Kind of entity the event is about (`"campaign"`, `"mapping"`).
    pub source_entity_type: Option<String>,
    pub source_entity_id: Option<String>,
    /// Counts and per-item outcomes.
    pub payload: serde_json::Value,
    pub occurred_at: Timestamp,
}

impl SuppressionEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            payload: serde_json::Value::Object(Default::default()),
            occurred_at: chrono::Utc::now(),
        }
    }

    pub fn with_source(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

const DEFAULT_CAPACITY: usize = 256;

/// Fan-out bus shared as `Arc<EventBus>`.
pub struct EventBus {
    sender: broadcast::Sender<SuppressionEvent>,
}

impl EventBus {
    /// When the buffer is full the oldest events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: SuppressionEvent) {
        tracing::debug!(event_type = %event.event_type, "Publishing event");
        // Err only means nobody is subscribed.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SuppressionEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
