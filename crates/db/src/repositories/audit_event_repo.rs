//! Repository for the `audit_events` table.

use sqlx::PgPool;

use crate::models::audit_event::CreateAuditEvent;

/// Append-only writes to the audit trail.
pub struct AuditEventRepo;

impl AuditEventRepo {
    /// Insert a new audit event, returning the generated id.
    pub async fn insert(pool: &PgPool, event: &CreateAuditEvent<'_>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO audit_events \
                (event_type, source_entity_type, source_entity_id, payload, occurred_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(event.event_type)
        .bind(event.source_entity_type)
        .bind(event.source_entity_id)
        .bind(event.payload)
        .bind(event.occurred_at)
        .fetch_one(pool)
        .await
    }
}
