//! Zero-sized repository structs, one per table. Every method takes a
//! `&PgPool` and returns `sqlx::Error` unchanged.

pub mod audit_event_repo;
pub mod campaign_mapping_repo;
pub mod suppression_record_repo;

pub use audit_event_repo::AuditEventRepo;
pub use campaign_mapping_repo::CampaignMappingRepo;
pub use suppression_record_repo::SuppressionRecordRepo;
