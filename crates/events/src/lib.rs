//! Suppression audit trail.
//!
//! - [`EventBus`] -- in-process fan-out of [`SuppressionEvent`]s, backed by
//!   `tokio::sync::broadcast`.
//! - [`EventPersistence`] -- background task writing every event to the
//!   `audit_events` table.

pub mod bus;
pub mod persistence;

pub use bus::{event_types, EventBus, SuppressionEvent};
pub use persistence::EventPersistence;
