//! Writes bus events to `audit_events`.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio_util::sync::CancellationToken;
use zoneguard_db::models::audit_event::CreateAuditEvent;
use zoneguard_db::repositories::AuditEventRepo;
use zoneguard_db::DbPool;

use crate::bus::SuppressionEvent;

/// Background service persisting suppression events.
pub struct EventPersistence;

impl EventPersistence {
    /// Persist events until the bus closes or `shutdown` fires.
    ///
    /// On shutdown, events already buffered in the receiver are written
    /// before returning.
    pub async fn run(
        pool: DbPool,
        mut receiver: broadcast::Receiver<SuppressionEvent>,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    Self::drain(&pool, &mut receiver).await;
                    tracing::info!("Event persistence stopped");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => Self::persist_logged(&pool, &event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Event persistence lagged, events were not persisted");
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!("Event bus closed, persistence shutting down");
                        break;
                    }
                },
            }
        }
    }

    async fn drain(pool: &DbPool, receiver: &mut broadcast::Receiver<SuppressionEvent>) {
        let mut drained = 0usize;
        loop {
            match receiver.try_recv() {
                Ok(event) => {
                    Self::persist_logged(pool, &event).await;
                    drained += 1;
                }
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        if drained > 0 {
            tracing::info!(drained, "Persisted buffered events before shutdown");
        }
    }

    async fn persist_logged(pool: &DbPool, event: &SuppressionEvent) {
        if let Err(e) = Self::persist(pool, event).await {
            tracing::error!(
                error = %e,
                event_type = %event.event_type,
                "Failed to persist event",
            );
        }
    }

    async fn persist(pool: &DbPool, event: &SuppressionEvent) -> Result<i64, sqlx::Error> {
        AuditEventRepo::insert(
            pool,
            &CreateAuditEvent {
                event_type: &event.event_type,
                source_entity_type: event.source_entity_type.as_deref(),
                source_entity_id: event.source_entity_id.as_deref(),
                payload: &event.payload,
                occurred_at: event.occurred_at,
            },
        )
        .await
    }
}
