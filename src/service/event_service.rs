//! Event service: listing CRUD and the lifecycle controller.
//!
//! Administrative cancellation cascades over every booked ticket of the
//! event as one batch under the event's write lock, releasing capacity
//! through the ledger for each. The cascade honors the same contract as
//! a single-ticket cancellation and serializes against any concurrent
//! booking.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::event::{Event, EventDraft, EventStatus, EventSummary};
use crate::domain::ledger;
use crate::domain::{EntityRegistry, EventBus, EventId, TicketEvent, TicketId, TicketStatus, UserId};
use crate::error::BoxofficeError;

/// Partial update accepted by [`EventService::update_event`].
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct EventUpdate {
    /// New display title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New venue.
    pub location: Option<String>,
    /// New catalog category.
    pub category: Option<String>,
    /// New doors-open instant.
    pub start_time: Option<DateTime<Utc>>,
    /// New doors-close instant.
    pub end_time: Option<DateTime<Utc>>,
    /// New capacity; never below the current sold count.
    pub capacity: Option<u32>,
    /// New per-ticket price (affects future purchases only).
    pub unit_price: Option<f64>,
}

/// Per-ticket failure inside a cascade cancellation.
#[derive(Debug, Clone, Serialize)]
pub struct CascadeFailure {
    /// Ticket that could not be cascade-cancelled.
    pub ticket_id: TicketId,
    /// Why the cascade step failed.
    pub error: String,
}

/// Outcome of an administrative event cancellation.
///
/// `failed` is reported rather than swallowed so the operator can
/// reconcile any ticket the cascade could not reach.
#[derive(Debug, Clone, Serialize)]
pub struct CascadeReport {
    /// The cancelled event.
    pub event_id: EventId,
    /// Tickets cancelled by the cascade, capacity released for each.
    pub cancelled: Vec<TicketId>,
    /// Tickets the cascade failed on.
    pub failed: Vec<CascadeFailure>,
}

/// Orchestration layer for event listings and their lifecycle.
#[derive(Debug, Clone)]
pub struct EventService {
    registry: Arc<EntityRegistry>,
    event_bus: EventBus,
}

impl EventService {
    /// Creates a new `EventService`.
    #[must_use]
    pub fn new(registry: Arc<EntityRegistry>, event_bus: EventBus) -> Self {
        Self {
            registry,
            event_bus,
        }
    }

    /// Returns a reference to the inner [`EntityRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<EntityRegistry> {
        &self.registry
    }

    /// Creates a new event listing owned by `created_by`.
    ///
    /// # Errors
    ///
    /// Returns [`BoxofficeError::InvalidRequest`] when the draft fails
    /// domain validation.
    pub async fn create_event(
        &self,
        draft: EventDraft,
        created_by: UserId,
    ) -> Result<Event, BoxofficeError> {
        let event = Event::new(draft, created_by)?;
        let snapshot = event.clone();
        let event_id = self.registry.insert_event(event).await?;

        let _ = self.event_bus.publish(TicketEvent::EventCreated {
            event_id,
            title: snapshot.title.clone(),
            capacity: snapshot.capacity,
            timestamp: snapshot.created_at,
        });

        tracing::info!(%event_id, title = %snapshot.title, capacity = snapshot.capacity, "event created");
        Ok(snapshot)
    }

    /// Returns a snapshot of one event, with its lifecycle state
    /// refreshed against the clock first.
    ///
    /// # Errors
    ///
    /// Returns [`BoxofficeError::EventNotFound`] if the event does not
    /// exist.
    pub async fn get_event(&self, event_id: EventId) -> Result<Event, BoxofficeError> {
        let slot = self.registry.event(event_id).await?;
        let mut event = slot.write().await;
        let transition = event.refresh_status(Utc::now());
        let snapshot = event.clone();
        drop(event);
        self.publish_transition(event_id, transition);
        Ok(snapshot)
    }

    /// Returns summaries of all events, optionally filtered by status.
    pub async fn list_events(&self, status_filter: Option<EventStatus>) -> Vec<EventSummary> {
        self.registry.list_events(status_filter).await
    }

    /// Applies a partial update to an event.
    ///
    /// Only the creator may edit, only while the event is `Upcoming` and
    /// before doors open. Capacity can never drop below the sold count.
    ///
    /// # Errors
    ///
    /// - [`BoxofficeError::EventNotFound`] if the event does not exist.
    /// - [`BoxofficeError::Unauthorized`] if `actor` is not the creator.
    /// - [`BoxofficeError::InvalidState`] once the event is past editing.
    /// - [`BoxofficeError::InvalidRequest`] for invalid field values.
    pub async fn update_event(
        &self,
        event_id: EventId,
        update: EventUpdate,
        actor: UserId,
    ) -> Result<Event, BoxofficeError> {
        let slot = self.registry.event(event_id).await?;
        let mut event = slot.write().await;

        let now = Utc::now();
        let transition = event.refresh_status(now);

        if event.created_by != actor {
            drop(event);
            self.publish_transition(event_id, transition);
            return Err(BoxofficeError::Unauthorized(format!(
                "event {event_id} belongs to another user"
            )));
        }
        if !event.is_editable(now) {
            let status = event.status;
            drop(event);
            self.publish_transition(event_id, transition);
            return Err(BoxofficeError::InvalidState(format!(
                "event {event_id} can no longer be edited (status: {status})"
            )));
        }

        apply_update(&mut event, update, now)?;
        let snapshot = event.clone();
        drop(event);

        self.publish_transition(event_id, transition);
        tracing::info!(%event_id, "event updated");
        Ok(snapshot)
    }

    /// Administratively cancels an event, cascade-cancelling every booked
    /// ticket and releasing its capacity in the same atomic batch.
    ///
    /// # Errors
    ///
    /// - [`BoxofficeError::EventNotFound`] if the event does not exist.
    /// - [`BoxofficeError::Unauthorized`] if `actor` is not the creator.
    /// - [`BoxofficeError::InvalidState`] if the event is already closed.
    pub async fn cancel_event(
        &self,
        event_id: EventId,
        actor: UserId,
        reason: &str,
    ) -> Result<CascadeReport, BoxofficeError> {
        let slot = self.registry.event(event_id).await?;
        let mut event = slot.write().await;

        let now = Utc::now();
        event.refresh_status(now);

        if event.created_by != actor {
            return Err(BoxofficeError::Unauthorized(format!(
                "event {event_id} belongs to another user"
            )));
        }
        event.cancel(now)?;

        // Cascade while still holding the event write lock: bookings and
        // single-ticket cancellations on this event stay serialized with
        // the batch, so the ledger and ticket set move together.
        let mut report = CascadeReport {
            event_id,
            cancelled: Vec::new(),
            failed: Vec::new(),
        };
        let mut cascade_events = Vec::new();
        for ticket_slot in self.registry.tickets_for_event(event_id).await {
            let mut ticket = ticket_slot.write().await;
            if ticket.status != TicketStatus::Booked {
                continue;
            }
            match ticket.cancel(now, format!("event cancelled: {reason}")) {
                Ok(()) => {
                    ledger::release(&mut event, ticket.quantity);
                    report.cancelled.push(ticket.id);
                    cascade_events.push(TicketEvent::TicketCancelled {
                        ticket_id: ticket.id,
                        event_id,
                        user_id: ticket.user_id,
                        quantity: ticket.quantity,
                        reason: format!("event cancelled: {reason}"),
                        timestamp: now,
                    });
                }
                Err(err) => {
                    report.failed.push(CascadeFailure {
                        ticket_id: ticket.id,
                        error: err.to_string(),
                    });
                }
            }
        }
        drop(event);

        for cascade_event in cascade_events {
            let _ = self.event_bus.publish(cascade_event);
        }
        let cascaded = u32::try_from(report.cancelled.len()).unwrap_or(u32::MAX);
        let _ = self.event_bus.publish(TicketEvent::EventCancelled {
            event_id,
            cascaded_tickets: cascaded,
            timestamp: now,
        });

        if report.failed.is_empty() {
            tracing::info!(%event_id, cascaded, "event cancelled");
        } else {
            tracing::error!(
                %event_id,
                cascaded,
                failed = report.failed.len(),
                "event cancelled with cascade failures"
            );
        }
        Ok(report)
    }

    /// Destroys an event listing. Refused while any ticket quantity is
    /// sold.
    ///
    /// # Errors
    ///
    /// - [`BoxofficeError::EventNotFound`] if the event does not exist.
    /// - [`BoxofficeError::Unauthorized`] if `actor` is not the creator.
    /// - [`BoxofficeError::InvalidState`] while tickets are sold.
    pub async fn delete_event(&self, event_id: EventId, actor: UserId) -> Result<(), BoxofficeError> {
        {
            let slot = self.registry.event(event_id).await?;
            let event = slot.read().await;
            if event.created_by != actor {
                return Err(BoxofficeError::Unauthorized(format!(
                    "event {event_id} belongs to another user"
                )));
            }
            if event.sold_tickets() > 0 {
                return Err(BoxofficeError::InvalidState(format!(
                    "event {event_id} still has sold tickets"
                )));
            }
        }

        let removed = self.registry.remove_event(event_id).await?;
        if removed.sold_tickets() > 0 {
            // A booking won the race between the check and the removal.
            self.registry.restore_event(removed, Vec::new()).await;
            return Err(BoxofficeError::InvalidState(format!(
                "event {event_id} still has sold tickets"
            )));
        }

        tracing::info!(%event_id, "event deleted");
        Ok(())
    }

    /// Advances every event's lifecycle state against the clock.
    ///
    /// Returns the transitions that fired. Run periodically by the
    /// background sweep.
    pub async fn sweep_lifecycles(&self) -> Vec<(EventId, EventStatus, EventStatus)> {
        let now = Utc::now();
        let mut transitions = Vec::new();
        for slot in self.registry.event_slots().await {
            let mut event = slot.write().await;
            if let Some((old_status, new_status)) = event.refresh_status(now) {
                transitions.push((event.id, old_status, new_status));
            }
        }
        for (event_id, old_status, new_status) in &transitions {
            tracing::debug!(%event_id, %old_status, %new_status, "lifecycle transition");
            let _ = self.event_bus.publish(TicketEvent::EventStatusChanged {
                event_id: *event_id,
                old_status: *old_status,
                new_status: *new_status,
                timestamp: now,
            });
        }
        transitions
    }

    fn publish_transition(
        &self,
        event_id: EventId,
        transition: Option<(EventStatus, EventStatus)>,
    ) {
        if let Some((old_status, new_status)) = transition {
            let _ = self.event_bus.publish(TicketEvent::EventStatusChanged {
                event_id,
                old_status,
                new_status,
                timestamp: Utc::now(),
            });
        }
    }
}

/// Applies and validates the patch fields onto a locked event.
fn apply_update(
    event: &mut Event,
    update: EventUpdate,
    now: DateTime<Utc>,
) -> Result<(), BoxofficeError> {
    if let Some(title) = &update.title
        && title.trim().is_empty()
    {
        return Err(BoxofficeError::InvalidRequest(
            "event title must not be empty".to_string(),
        ));
    }
    if let Some(category) = &update.category
        && !crate::domain::event::is_valid_category(category)
    {
        return Err(BoxofficeError::InvalidRequest(format!(
            "unknown event category: {category}"
        )));
    }
    let start_time = update.start_time.unwrap_or(event.start_time);
    let end_time = update.end_time.unwrap_or(event.end_time);
    if end_time <= start_time {
        return Err(BoxofficeError::InvalidRequest(
            "end time must be after start time".to_string(),
        ));
    }
    if let Some(capacity) = update.capacity {
        if capacity == 0 {
            return Err(BoxofficeError::InvalidRequest(
                "event capacity must be positive".to_string(),
            ));
        }
        if capacity < event.sold_tickets() {
            return Err(BoxofficeError::InvalidRequest(format!(
                "capacity {capacity} is below the {} tickets already sold",
                event.sold_tickets()
            )));
        }
    }
    if let Some(unit_price) = update.unit_price
        && (!unit_price.is_finite() || unit_price < 0.0)
    {
        return Err(BoxofficeError::InvalidRequest(
            "ticket price must be a non-negative number".to_string(),
        ));
    }

    if let Some(title) = update.title {
        event.title = title;
    }
    if let Some(description) = update.description {
        event.description = description;
    }
    if let Some(location) = update.location {
        event.location = location;
    }
    if let Some(category) = update.category {
        event.category = category;
    }
    event.start_time = start_time;
    event.end_time = end_time;
    if let Some(capacity) = update.capacity {
        event.capacity = capacity;
    }
    if let Some(unit_price) = update.unit_price {
        event.unit_price = unit_price;
    }
    event.updated_at = now;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::service::TicketService;
    use chrono::Duration;

    fn make_services() -> (EventService, TicketService) {
        let registry = Arc::new(EntityRegistry::new());
        let event_bus = EventBus::new(1000);
        (
            EventService::new(Arc::clone(&registry), event_bus.clone()),
            TicketService::new(registry, event_bus),
        )
    }

    fn draft() -> EventDraft {
        EventDraft {
            title: "Street Food Market".to_string(),
            description: "Twelve kitchens, one square".to_string(),
            location: "Old Town Square".to_string(),
            category: "food".to_string(),
            start_time: Utc::now() + Duration::days(5),
            end_time: Utc::now() + Duration::days(6),
            capacity: 20,
            unit_price: 15.0,
        }
    }

    #[tokio::test]
    async fn create_and_get_round_trip() {
        let (events, _) = make_services();
        let creator = UserId::new();
        let Ok(created) = events.create_event(draft(), creator).await else {
            panic!("create failed");
        };
        let Ok(fetched) = events.get_event(created.id).await else {
            panic!("get failed");
        };
        assert_eq!(fetched.title, "Street Food Market");
        assert_eq!(fetched.status, EventStatus::Upcoming);
        assert_eq!(fetched.created_by, creator);
    }

    #[tokio::test]
    async fn create_rejects_bad_category() {
        let (events, _) = make_services();
        let mut d = draft();
        d.category = "rodeo".to_string();
        assert!(events.create_event(d, UserId::new()).await.is_err());
    }

    #[tokio::test]
    async fn update_applies_patch_fields() {
        let (events, _) = make_services();
        let creator = UserId::new();
        let Ok(created) = events.create_event(draft(), creator).await else {
            panic!("create failed");
        };

        let update = EventUpdate {
            title: Some("Night Food Market".to_string()),
            unit_price: Some(18.0),
            capacity: Some(40),
            ..EventUpdate::default()
        };
        let Ok(updated) = events.update_event(created.id, update, creator).await else {
            panic!("update failed");
        };
        assert_eq!(updated.title, "Night Food Market");
        assert!((updated.unit_price - 18.0).abs() < f64::EPSILON);
        assert_eq!(updated.capacity, 40);
    }

    #[tokio::test]
    async fn update_by_stranger_unauthorized() {
        let (events, _) = make_services();
        let Ok(created) = events.create_event(draft(), UserId::new()).await else {
            panic!("create failed");
        };
        let result = events
            .update_event(created.id, EventUpdate::default(), UserId::new())
            .await;
        assert!(matches!(result, Err(BoxofficeError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn update_after_doors_open_rejected() {
        let (events, _) = make_services();
        let creator = UserId::new();
        let mut d = draft();
        d.start_time = Utc::now() - Duration::hours(1);
        d.end_time = Utc::now() + Duration::hours(3);
        let Ok(created) = events.create_event(d, creator).await else {
            panic!("create failed");
        };

        let result = events
            .update_event(created.id, EventUpdate::default(), creator)
            .await;
        assert!(matches!(result, Err(BoxofficeError::InvalidState(_))));
    }

    #[tokio::test]
    async fn capacity_cannot_drop_below_sold() {
        let (events, tickets) = make_services();
        let creator = UserId::new();
        let Ok(created) = events.create_event(draft(), creator).await else {
            panic!("create failed");
        };
        let Ok(_) = tickets.book_ticket(created.id, UserId::new(), 5).await else {
            panic!("booking failed");
        };

        let shrink = EventUpdate {
            capacity: Some(3),
            ..EventUpdate::default()
        };
        let result = events.update_event(created.id, shrink, creator).await;
        assert!(matches!(result, Err(BoxofficeError::InvalidRequest(_))));

        let grow = EventUpdate {
            capacity: Some(5),
            ..EventUpdate::default()
        };
        assert!(events.update_event(created.id, grow, creator).await.is_ok());
    }

    #[tokio::test]
    async fn cancel_event_cascades_and_releases_capacity() {
        let (events, tickets) = make_services();
        let creator = UserId::new();
        let alice = UserId::new();
        let bob = UserId::new();
        let Ok(created) = events.create_event(draft(), creator).await else {
            panic!("create failed");
        };

        let Ok(kept) = tickets.book_ticket(created.id, alice, 2).await else {
            panic!("booking failed");
        };
        let Ok(dropped) = tickets.book_ticket(created.id, bob, 3).await else {
            panic!("booking failed");
        };
        let Ok(_) = tickets
            .cancel_ticket(dropped.id, bob, "sold on".to_string())
            .await
        else {
            panic!("cancel failed");
        };

        let Ok(report) = events
            .cancel_event(created.id, creator, "venue flooded")
            .await
        else {
            panic!("cancel event failed");
        };
        assert_eq!(report.cancelled, vec![kept.id]);
        assert!(report.failed.is_empty());

        let Ok(availability) = tickets.availability(created.id).await else {
            panic!("availability failed");
        };
        assert_eq!(availability.sold_tickets, 0);

        let Ok(cascaded) = tickets.ticket(kept.id).await else {
            panic!("ticket missing");
        };
        assert_eq!(cascaded.status, TicketStatus::Cancelled);
        assert!(
            cascaded
                .cancel_reason
                .as_deref()
                .is_some_and(|r| r.contains("venue flooded"))
        );

        let Ok(event) = events.get_event(created.id).await else {
            panic!("get failed");
        };
        assert_eq!(event.status, EventStatus::Cancelled);
        assert!(!event.is_active);
    }

    #[tokio::test]
    async fn cancel_event_by_stranger_unauthorized() {
        let (events, _) = make_services();
        let Ok(created) = events.create_event(draft(), UserId::new()).await else {
            panic!("create failed");
        };
        let result = events
            .cancel_event(created.id, UserId::new(), "not mine")
            .await;
        assert!(matches!(result, Err(BoxofficeError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn cancel_event_twice_rejected() {
        let (events, _) = make_services();
        let creator = UserId::new();
        let Ok(created) = events.create_event(draft(), creator).await else {
            panic!("create failed");
        };
        let Ok(_) = events.cancel_event(created.id, creator, "first").await else {
            panic!("cancel failed");
        };
        let second = events.cancel_event(created.id, creator, "second").await;
        assert!(matches!(second, Err(BoxofficeError::InvalidState(_))));
    }

    #[tokio::test]
    async fn booking_after_event_cancellation_rejected() {
        let (events, tickets) = make_services();
        let creator = UserId::new();
        let Ok(created) = events.create_event(draft(), creator).await else {
            panic!("create failed");
        };
        let Ok(_) = events.cancel_event(created.id, creator, "done").await else {
            panic!("cancel failed");
        };
        let result = tickets.book_ticket(created.id, UserId::new(), 1).await;
        assert!(matches!(result, Err(BoxofficeError::EventUnavailable(_))));
    }

    #[tokio::test]
    async fn delete_refused_while_tickets_sold() {
        let (events, tickets) = make_services();
        let creator = UserId::new();
        let Ok(created) = events.create_event(draft(), creator).await else {
            panic!("create failed");
        };
        let buyer = UserId::new();
        let Ok(ticket) = tickets.book_ticket(created.id, buyer, 1).await else {
            panic!("booking failed");
        };

        let blocked = events.delete_event(created.id, creator).await;
        assert!(matches!(blocked, Err(BoxofficeError::InvalidState(_))));

        let Ok(_) = tickets
            .cancel_ticket(ticket.id, buyer, "freeing the event".to_string())
            .await
        else {
            panic!("cancel failed");
        };
        let Ok(()) = events.delete_event(created.id, creator).await else {
            panic!("delete failed");
        };
        assert!(matches!(
            events.get_event(created.id).await,
            Err(BoxofficeError::EventNotFound(_))
        ));
    }

    #[tokio::test]
    async fn sweep_advances_overdue_events() {
        let (events, _) = make_services();
        let creator = UserId::new();

        let mut live = draft();
        live.start_time = Utc::now() - Duration::hours(1);
        live.end_time = Utc::now() + Duration::hours(2);
        let Ok(running) = events.create_event(live, creator).await else {
            panic!("create failed");
        };

        let Ok(future) = events.create_event(draft(), creator).await else {
            panic!("create failed");
        };

        let transitions = events.sweep_lifecycles().await;
        assert_eq!(transitions.len(), 1);
        assert_eq!(
            transitions.first(),
            Some(&(running.id, EventStatus::Upcoming, EventStatus::Ongoing))
        );

        let Ok(untouched) = events.get_event(future.id).await else {
            panic!("get failed");
        };
        assert_eq!(untouched.status, EventStatus::Upcoming);
    }
}
