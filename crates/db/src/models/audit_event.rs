use zoneguard_core::types::Timestamp;

/// DTO for inserting an audit event.
#[derive(Debug, Clone)]
pub struct CreateAuditEvent<'a> {
    pub event_type: &'a str,
    pub source_entity_type: Option<&'a str>,
    pub source_entity_id: Option<&'a str>,
    pub payload: &'a serde_json::Value,
    pub occurred_at: Timestamp,
}
