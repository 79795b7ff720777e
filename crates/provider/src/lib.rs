//! HTTP clients for the ad network's blacklist resource and the reporting
//! service.
//!
//! Both clients implement the seams defined in `zoneguard_core::gateway` and
//! make exactly one attempt per call.

pub mod blacklist;
pub mod config;
pub mod reporting;
pub mod response;

pub use blacklist::BlacklistClient;
pub use config::{ProviderConfig, ReportingConfig};
pub use reporting::ReportingClient;
