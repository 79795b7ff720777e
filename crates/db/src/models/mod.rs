//! Row types for the persisted tables.
//!
//! Each row converts into its `zoneguard-core` domain type; the rows
//! themselves never leave this crate's public repository API.

pub mod audit_event;
pub mod campaign_mapping;
pub mod suppression_record;
