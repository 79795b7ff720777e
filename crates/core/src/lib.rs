//! Zoneguard domain logic.
//!
//! Pure types and functions shared by the storage, provider, orchestration
//! and HTTP layers. Nothing in this crate performs I/O; the async seams
//! ([`gateway`] and [`store`]) are traits implemented elsewhere.

pub mod campaign_identity;
pub mod error;
pub mod gateway;
pub mod recommendation;
pub mod store;
pub mod suppression;
pub mod types;
pub mod zone_extraction;
