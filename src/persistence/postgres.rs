//! PostgreSQL implementation of the persistence layer.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{EventSnapshot, StoredTicketEvent};
use crate::domain::{EntityRegistry, Event, Ticket};
use crate::error::BoxofficeError;

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends a domain event to the audit log.
    ///
    /// # Errors
    ///
    /// Returns a [`BoxofficeError::PersistenceError`] on database failure.
    pub async fn save_event(
        &self,
        event_id: Uuid,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<i64, BoxofficeError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO ticket_events (event_id, event_type, payload) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(event_id)
        .bind(event_type)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| BoxofficeError::PersistenceError(e.to_string()))?;

        Ok(row)
    }

    /// Saves one event's registry snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`BoxofficeError::PersistenceError`] on database failure.
    pub async fn save_snapshot(
        &self,
        event_id: Uuid,
        event_json: &serde_json::Value,
        tickets_json: &serde_json::Value,
    ) -> Result<i64, BoxofficeError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO event_snapshots (event_id, event_json, tickets_json) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(event_id)
        .bind(event_json)
        .bind(tickets_json)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| BoxofficeError::PersistenceError(e.to_string()))?;

        Ok(row)
    }

    /// Loads the latest snapshot for each event using `DISTINCT ON`.
    ///
    /// # Errors
    ///
    /// Returns a [`BoxofficeError::PersistenceError`] on database failure.
    pub async fn load_latest_snapshots(&self) -> Result<Vec<EventSnapshot>, BoxofficeError> {
        let rows = sqlx::query_as::<_, (i64, Uuid, serde_json::Value, serde_json::Value, DateTime<Utc>)>(
            "SELECT DISTINCT ON (event_id) id, event_id, event_json, tickets_json, snapshot_at \
             FROM event_snapshots ORDER BY event_id, snapshot_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BoxofficeError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, event_id, event_json, tickets_json, snapshot_at)| EventSnapshot {
                id,
                event_id,
                event_json,
                tickets_json,
                snapshot_at,
            })
            .collect())
    }

    /// Loads audit events after the given timestamp, optionally filtered
    /// by event ID.
    ///
    /// # Errors
    ///
    /// Returns a [`BoxofficeError::PersistenceError`] on database failure.
    pub async fn load_events_after(
        &self,
        after: DateTime<Utc>,
        event_id: Option<Uuid>,
    ) -> Result<Vec<StoredTicketEvent>, BoxofficeError> {
        let rows = if let Some(id) = event_id {
            sqlx::query_as::<_, (i64, Uuid, String, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, event_id, event_type, payload, created_at FROM ticket_events \
                 WHERE created_at > $1 AND event_id = $2 ORDER BY created_at ASC",
            )
            .bind(after)
            .bind(id)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, (i64, Uuid, String, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, event_id, event_type, payload, created_at FROM ticket_events \
                 WHERE created_at > $1 ORDER BY created_at ASC",
            )
            .bind(after)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| BoxofficeError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, event_id, event_type, payload, created_at)| StoredTicketEvent {
                    id,
                    event_id,
                    event_type,
                    payload,
                    created_at,
                },
            )
            .collect())
    }

    /// Deletes snapshots older than the given number of days.
    ///
    /// # Errors
    ///
    /// Returns a [`BoxofficeError::PersistenceError`] on database failure.
    pub async fn delete_old_snapshots(&self, before_days: u64) -> Result<u64, BoxofficeError> {
        let cutoff =
            Utc::now() - chrono::Duration::days(i64::try_from(before_days).unwrap_or(i64::MAX));

        let result = sqlx::query("DELETE FROM event_snapshots WHERE snapshot_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| BoxofficeError::PersistenceError(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// Snapshots every event in the registry, one row per event.
    ///
    /// # Errors
    ///
    /// Returns a [`BoxofficeError::PersistenceError`] on the first
    /// database or serialization failure.
    pub async fn snapshot_registry(
        &self,
        registry: &EntityRegistry,
    ) -> Result<usize, BoxofficeError> {
        let mut saved = 0;
        for slot in registry.event_slots().await {
            let event = slot.read().await.clone();
            let mut tickets = Vec::new();
            for ticket_slot in registry.tickets_for_event(event.id).await {
                tickets.push(ticket_slot.read().await.clone());
            }

            let event_json = serde_json::to_value(&event)
                .map_err(|e| BoxofficeError::PersistenceError(e.to_string()))?;
            let tickets_json = serde_json::to_value(&tickets)
                .map_err(|e| BoxofficeError::PersistenceError(e.to_string()))?;
            self.save_snapshot(*event.id.as_uuid(), &event_json, &tickets_json)
                .await?;
            saved += 1;
        }
        Ok(saved)
    }

    /// Repopulates the registry from the latest snapshots. Run at boot,
    /// before the registry is shared with the services.
    ///
    /// # Errors
    ///
    /// Returns a [`BoxofficeError::PersistenceError`] on database failure
    /// or on a snapshot that no longer deserializes.
    pub async fn restore_registry(
        &self,
        registry: &EntityRegistry,
    ) -> Result<usize, BoxofficeError> {
        let snapshots = self.load_latest_snapshots().await?;
        let mut restored = 0;
        for snapshot in snapshots {
            let event: Event = serde_json::from_value(snapshot.event_json)
                .map_err(|e| BoxofficeError::PersistenceError(e.to_string()))?;
            let tickets: Vec<Ticket> = serde_json::from_value(snapshot.tickets_json)
                .map_err(|e| BoxofficeError::PersistenceError(e.to_string()))?;
            registry.restore_event(event, tickets).await;
            restored += 1;
        }
        Ok(restored)
    }
}
