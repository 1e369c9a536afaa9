//! Concurrent entity storage with per-event fine-grained locking.
//!
//! [`EntityRegistry`] is the in-process entity store for [`Event`] and
//! [`Ticket`] records. Each event is individually protected by a
//! [`tokio::sync::RwLock`]; an event's write lock doubles as the
//! transaction scope for every mutation touching its capacity counter, so
//! the paired "reserve + insert ticket" and "release + cancel ticket"
//! writes commit as one atomic unit. A dedicated code index enforces the
//! global uniqueness of booking codes at insert time.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::event::{Event, EventStatus, EventSummary};
use super::id::{EventId, TicketId, UserId};
use super::ticket::Ticket;
use crate::error::BoxofficeError;

/// Central store for all events and tickets.
///
/// # Concurrency
///
/// - Multiple tasks may read the same event concurrently.
/// - Writes to different events are concurrent.
/// - Writes to the same event are serialized; this is the discipline that
///   makes the ledger's check-and-increment indivisible.
/// - Lock order is always event, then code index, then ticket; every
///   caller follows it, so the registry cannot deadlock.
#[derive(Debug)]
pub struct EntityRegistry {
    events: RwLock<HashMap<EventId, Arc<RwLock<Event>>>>,
    tickets: RwLock<HashMap<TicketId, Arc<RwLock<Ticket>>>>,
    /// Unique index over `Ticket::booking_code`.
    codes: Mutex<HashSet<String>>,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
            tickets: RwLock::new(HashMap::new()),
            codes: Mutex::new(HashSet::new()),
        }
    }

    /// Inserts a new event into the registry.
    ///
    /// # Errors
    ///
    /// Returns [`BoxofficeError::InvalidRequest`] if an event with the
    /// same ID already exists (should never happen with UUID v4).
    pub async fn insert_event(&self, event: Event) -> Result<EventId, BoxofficeError> {
        let event_id = event.id;
        let mut map = self.events.write().await;
        if map.contains_key(&event_id) {
            return Err(BoxofficeError::InvalidRequest(format!(
                "event {event_id} already exists"
            )));
        }
        map.insert(event_id, Arc::new(RwLock::new(event)));
        Ok(event_id)
    }

    /// Returns a shared reference to the event behind its per-event lock.
    ///
    /// # Errors
    ///
    /// Returns [`BoxofficeError::EventNotFound`] if no event with the
    /// given ID exists.
    pub async fn event(&self, event_id: EventId) -> Result<Arc<RwLock<Event>>, BoxofficeError> {
        let map = self.events.read().await;
        map.get(&event_id)
            .cloned()
            .ok_or(BoxofficeError::EventNotFound(*event_id.as_uuid()))
    }

    /// Removes an event from the registry, returning its record.
    ///
    /// Callers must have verified that the event has no sold tickets; the
    /// registry itself only removes the slot.
    ///
    /// # Errors
    ///
    /// Returns [`BoxofficeError::EventNotFound`] if no event with the
    /// given ID exists, or [`BoxofficeError::Internal`] if the slot is
    /// still referenced by an in-flight operation.
    pub async fn remove_event(&self, event_id: EventId) -> Result<Event, BoxofficeError> {
        let mut map = self.events.write().await;
        let arc = map
            .remove(&event_id)
            .ok_or(BoxofficeError::EventNotFound(*event_id.as_uuid()))?;
        let event = Arc::try_unwrap(arc)
            .map_err(|_| {
                BoxofficeError::Internal("event record still referenced elsewhere".to_string())
            })?
            .into_inner();
        Ok(event)
    }

    /// Returns summaries of all events, optionally filtered by status.
    pub async fn list_events(&self, status_filter: Option<EventStatus>) -> Vec<EventSummary> {
        let map = self.events.read().await;
        let mut summaries = Vec::with_capacity(map.len());
        for slot in map.values() {
            let event = slot.read().await;
            if let Some(filter) = status_filter
                && event.status != filter
            {
                continue;
            }
            summaries.push(EventSummary::from(&*event));
        }
        summaries
    }

    /// Returns handles to every event slot, for the lifecycle sweep.
    pub async fn event_slots(&self) -> Vec<Arc<RwLock<Event>>> {
        self.events.read().await.values().cloned().collect()
    }

    /// Returns the number of events in the registry.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    /// Returns `true` if the registry contains no events.
    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    /// Inserts a ticket, enforcing booking-code uniqueness.
    ///
    /// The caller holds the owning event's write lock, so the insert
    /// commits inside the same atomic unit as the capacity reservation.
    ///
    /// # Errors
    ///
    /// Returns [`BoxofficeError::CodeCollision`] when the booking code is
    /// already taken (the booking engine regenerates and retries), or
    /// [`BoxofficeError::Internal`] on a duplicate ticket ID.
    pub async fn insert_ticket(&self, ticket: Ticket) -> Result<(), BoxofficeError> {
        let mut codes = self.codes.lock().await;
        if codes.contains(&ticket.booking_code) {
            return Err(BoxofficeError::CodeCollision(ticket.booking_code));
        }
        let mut map = self.tickets.write().await;
        if map.contains_key(&ticket.id) {
            return Err(BoxofficeError::Internal(format!(
                "ticket {} already exists",
                ticket.id
            )));
        }
        codes.insert(ticket.booking_code.clone());
        map.insert(ticket.id, Arc::new(RwLock::new(ticket)));
        Ok(())
    }

    /// Returns a shared reference to the ticket behind its lock.
    ///
    /// # Errors
    ///
    /// Returns [`BoxofficeError::TicketNotFound`] if no ticket with the
    /// given ID exists.
    pub async fn ticket(&self, ticket_id: TicketId) -> Result<Arc<RwLock<Ticket>>, BoxofficeError> {
        let map = self.tickets.read().await;
        map.get(&ticket_id)
            .cloned()
            .ok_or(BoxofficeError::TicketNotFound(*ticket_id.as_uuid()))
    }

    /// Returns handles to every ticket booked against `event_id`.
    pub async fn tickets_for_event(&self, event_id: EventId) -> Vec<Arc<RwLock<Ticket>>> {
        let map = self.tickets.read().await;
        let mut out = Vec::new();
        for slot in map.values() {
            if slot.read().await.event_id == event_id {
                out.push(Arc::clone(slot));
            }
        }
        out
    }

    /// Returns snapshots of every ticket owned by `user_id`, newest
    /// purchase first.
    pub async fn tickets_for_user(&self, user_id: UserId) -> Vec<Ticket> {
        let map = self.tickets.read().await;
        let mut out = Vec::new();
        for slot in map.values() {
            let ticket = slot.read().await;
            if ticket.user_id == user_id {
                out.push(ticket.clone());
            }
        }
        out.sort_by(|a, b| b.purchase_date.cmp(&a.purchase_date));
        out
    }

    /// Repopulates one event and its tickets from a durable snapshot.
    ///
    /// Used at boot only, before the registry is shared; existing records
    /// with the same ids are replaced.
    pub async fn restore_event(&self, event: Event, tickets: Vec<Ticket>) {
        let event_id = event.id;
        self.events
            .write()
            .await
            .insert(event_id, Arc::new(RwLock::new(event)));
        let mut codes = self.codes.lock().await;
        let mut map = self.tickets.write().await;
        for ticket in tickets {
            codes.insert(ticket.booking_code.clone());
            map.insert(ticket.id, Arc::new(RwLock::new(ticket)));
        }
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
