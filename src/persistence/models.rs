//! Database models for the audit event log and registry snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored domain event row from the `ticket_events` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTicketEvent {
    /// Auto-increment row ID.
    pub id: i64,
    /// Event listing the domain event concerns.
    pub event_id: Uuid,
    /// Event type discriminator (e.g. `"ticket_booked"`).
    pub event_type: String,
    /// JSONB payload with event-specific data.
    pub payload: serde_json::Value,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A registry snapshot row from the `event_snapshots` table.
///
/// One row per event: the event record plus every ticket booked against
/// it, serialized as JSONB. The newest row per event wins at restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSnapshot {
    /// Auto-increment row ID.
    pub id: i64,
    /// Event that was snapshotted.
    pub event_id: Uuid,
    /// Full event record as JSONB.
    pub event_json: serde_json::Value,
    /// All tickets of the event as a JSONB array.
    pub tickets_json: serde_json::Value,
    /// Snapshot timestamp.
    pub snapshot_at: DateTime<Utc>,
}
