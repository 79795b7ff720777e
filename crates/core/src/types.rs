/// Ledger records and mappings are keyed by time-ordered UUIDs (v7).
pub type RecordId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
