//! Event record, lifecycle state machine, and summary projection.
//!
//! An [`Event`] is the unit of capacity: it carries the `(capacity,
//! sold_tickets)` pair that the whole engine exists to protect. The
//! `sold_tickets` counter is private to the domain layer; only the
//! [`super::ledger`] module writes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{EventId, UserId};
use crate::error::BoxofficeError;

/// Categories an event may be filed under.
///
/// Mirrors the operator's catalog; `create_event` rejects anything else.
pub const CATEGORIES: &[&str] = &[
    "conference",
    "workshop",
    "seminar",
    "concert",
    "sports",
    "exhibition",
    "networking",
    "entertainment",
    "education",
    "technology",
    "business",
    "health",
    "food",
    "art",
    "other",
];

/// Returns `true` if `category` is part of [`CATEGORIES`].
#[must_use]
pub fn is_valid_category(category: &str) -> bool {
    CATEGORIES.contains(&category)
}

/// Lifecycle state of an event.
///
/// Closed set: illegal transitions are rejected by
/// [`EventStatus::can_transition_to`] rather than by convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Created, doors not yet open. The only editable state.
    Upcoming,
    /// Between `start_time` and `end_time`. Booking still allowed.
    Ongoing,
    /// Past `end_time`. Terminal.
    Completed,
    /// Administratively cancelled. Terminal.
    Cancelled,
}

impl EventStatus {
    /// Returns the status as its wire string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` for states that admit no further transition.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Exhaustive transition check for the lifecycle state machine.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Upcoming, Self::Ongoing | Self::Completed | Self::Cancelled)
            | (Self::Ongoing, Self::Completed | Self::Cancelled) => true,
            (
                Self::Upcoming | Self::Ongoing | Self::Completed | Self::Cancelled,
                Self::Upcoming,
            )
            | (Self::Ongoing, Self::Ongoing)
            | (Self::Completed | Self::Cancelled, _) => false,
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventStatus {
    type Err = BoxofficeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(Self::Upcoming),
            "ongoing" => Ok(Self::Ongoing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(BoxofficeError::InvalidRequest(format!(
                "unknown event status: {other}"
            ))),
        }
    }
}

/// Field set accepted when creating an event.
#[derive(Debug, Clone)]
pub struct EventDraft {
    /// Display title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Venue or address.
    pub location: String,
    /// One of [`CATEGORIES`].
    pub category: String,
    /// Doors-open instant.
    pub start_time: DateTime<Utc>,
    /// Doors-close instant. Must be after `start_time`.
    pub end_time: DateTime<Utc>,
    /// Maximum total ticket quantity sellable. Must be positive.
    pub capacity: u32,
    /// Price per ticket at listing time.
    pub unit_price: f64,
}

/// A sellable event with bounded capacity.
///
/// # Invariants
///
/// - `0 <= sold_tickets <= capacity` at all times, including under
///   concurrent bookings (enforced by [`super::ledger`] together with the
///   per-event write lock in the registry).
/// - `sold_tickets` equals the summed quantity of this event's
///   non-cancelled tickets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier (immutable after creation).
    pub id: EventId,
    /// Display title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Venue or address.
    pub location: String,
    /// Catalog category.
    pub category: String,
    /// Current lifecycle state.
    pub status: EventStatus,
    /// Doors-open instant.
    pub start_time: DateTime<Utc>,
    /// Doors-close instant.
    pub end_time: DateTime<Utc>,
    /// Maximum total ticket quantity sellable.
    pub capacity: u32,
    /// Price per ticket; snapshotted into tickets at purchase time.
    pub unit_price: f64,
    /// Sold quantity. Written only by [`super::ledger`].
    pub(in crate::domain) sold_tickets: u32,
    /// Owning user (event creator). Immutable.
    pub created_by: UserId,
    /// Kill switch: an inactive event accepts no bookings regardless of
    /// lifecycle state.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of last mutation.
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Creates a new `Upcoming`, active event from a validated draft.
    ///
    /// # Errors
    ///
    /// Returns [`BoxofficeError::InvalidRequest`] if the title is empty,
    /// the category is not in the catalog, the capacity is zero, the
    /// price is negative or non-finite, or `end_time` is not after
    /// `start_time`.
    pub fn new(draft: EventDraft, created_by: UserId) -> Result<Self, BoxofficeError> {
        if draft.title.trim().is_empty() {
            return Err(BoxofficeError::InvalidRequest(
                "event title must not be empty".to_string(),
            ));
        }
        if !is_valid_category(&draft.category) {
            return Err(BoxofficeError::InvalidRequest(format!(
                "unknown event category: {}",
                draft.category
            )));
        }
        if draft.capacity == 0 {
            return Err(BoxofficeError::InvalidRequest(
                "event capacity must be positive".to_string(),
            ));
        }
        if !draft.unit_price.is_finite() || draft.unit_price < 0.0 {
            return Err(BoxofficeError::InvalidRequest(
                "ticket price must be a non-negative number".to_string(),
            ));
        }
        if draft.end_time <= draft.start_time {
            return Err(BoxofficeError::InvalidRequest(
                "end time must be after start time".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: EventId::new(),
            title: draft.title,
            description: draft.description,
            location: draft.location,
            category: draft.category,
            status: EventStatus::Upcoming,
            start_time: draft.start_time,
            end_time: draft.end_time,
            capacity: draft.capacity,
            unit_price: draft.unit_price,
            sold_tickets: 0,
            created_by,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the sold quantity.
    #[must_use]
    pub const fn sold_tickets(&self) -> u32 {
        self.sold_tickets
    }

    /// Returns the unsold quantity.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.sold_tickets)
    }

    /// Advances the lifecycle state against the clock.
    ///
    /// `upcoming -> ongoing` once `now >= start_time`, and any
    /// non-terminal state `-> completed` once `now >= end_time`.
    /// Returns the `(old, new)` pair when a transition fired.
    pub fn refresh_status(&mut self, now: DateTime<Utc>) -> Option<(EventStatus, EventStatus)> {
        if self.status.is_terminal() {
            return None;
        }
        let next = if now >= self.end_time {
            EventStatus::Completed
        } else if now >= self.start_time {
            EventStatus::Ongoing
        } else {
            return None;
        };
        if next == self.status || !self.status.can_transition_to(next) {
            return None;
        }
        let old = self.status;
        self.status = next;
        self.updated_at = now;
        Some((old, next))
    }

    /// Returns `true` if tickets may currently be booked against this
    /// event: it is active, not past its end, and in a sellable state.
    #[must_use]
    pub fn is_bookable(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && now < self.end_time
            && matches!(self.status, EventStatus::Upcoming | EventStatus::Ongoing)
    }

    /// Returns `true` while the event may still be edited: only before
    /// doors open, and only in the `Upcoming` state.
    #[must_use]
    pub fn is_editable(&self, now: DateTime<Utc>) -> bool {
        self.status == EventStatus::Upcoming && now < self.start_time
    }

    /// Administratively cancels the event.
    ///
    /// # Errors
    ///
    /// Returns [`BoxofficeError::InvalidState`] unless the current state
    /// is `Upcoming` or `Ongoing`.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), BoxofficeError> {
        if !self.status.can_transition_to(EventStatus::Cancelled) {
            return Err(BoxofficeError::InvalidState(format!(
                "event in state {} cannot be cancelled",
                self.status
            )));
        }
        self.status = EventStatus::Cancelled;
        self.is_active = false;
        self.updated_at = now;
        Ok(())
    }
}

/// Lightweight projection of an event for list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    /// Event identifier.
    pub id: EventId,
    /// Display title.
    pub title: String,
    /// Catalog category.
    pub category: String,
    /// Current lifecycle state.
    pub status: EventStatus,
    /// Doors-open instant.
    pub start_time: DateTime<Utc>,
    /// Maximum sellable quantity.
    pub capacity: u32,
    /// Sold quantity.
    pub sold_tickets: u32,
    /// Price per ticket.
    pub unit_price: f64,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            category: event.category.clone(),
            status: event.status,
            start_time: event.start_time,
            capacity: event.capacity,
            sold_tickets: event.sold_tickets,
            unit_price: event.unit_price,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft() -> EventDraft {
        EventDraft {
            title: "RustConf".to_string(),
            description: "All things Rust".to_string(),
            location: "Berlin".to_string(),
            category: "conference".to_string(),
            start_time: Utc::now() + Duration::days(7),
            end_time: Utc::now() + Duration::days(8),
            capacity: 100,
            unit_price: 50.0,
        }
    }

    #[test]
    fn new_event_is_upcoming_and_active() {
        let Ok(event) = Event::new(draft(), UserId::new()) else {
            panic!("valid draft rejected");
        };
        assert_eq!(event.status, EventStatus::Upcoming);
        assert!(event.is_active);
        assert_eq!(event.sold_tickets(), 0);
        assert_eq!(event.remaining(), 100);
    }

    #[test]
    fn zero_capacity_rejected() {
        let mut d = draft();
        d.capacity = 0;
        assert!(Event::new(d, UserId::new()).is_err());
    }

    #[test]
    fn negative_price_rejected() {
        let mut d = draft();
        d.unit_price = -1.0;
        assert!(Event::new(d, UserId::new()).is_err());
    }

    #[test]
    fn end_before_start_rejected() {
        let mut d = draft();
        d.end_time = d.start_time - Duration::hours(1);
        assert!(Event::new(d, UserId::new()).is_err());
    }

    #[test]
    fn unknown_category_rejected() {
        let mut d = draft();
        d.category = "rodeo".to_string();
        assert!(Event::new(d, UserId::new()).is_err());
    }

    #[test]
    fn refresh_advances_to_ongoing_at_start() {
        let Ok(mut event) = Event::new(draft(), UserId::new()) else {
            panic!("valid draft rejected");
        };
        let transition = event.refresh_status(event.start_time + Duration::minutes(1));
        assert_eq!(
            transition,
            Some((EventStatus::Upcoming, EventStatus::Ongoing))
        );
        assert_eq!(event.status, EventStatus::Ongoing);
    }

    #[test]
    fn refresh_advances_to_completed_after_end() {
        let Ok(mut event) = Event::new(draft(), UserId::new()) else {
            panic!("valid draft rejected");
        };
        let transition = event.refresh_status(event.end_time + Duration::minutes(1));
        assert_eq!(
            transition,
            Some((EventStatus::Upcoming, EventStatus::Completed))
        );
    }

    #[test]
    fn refresh_is_noop_before_start() {
        let Ok(mut event) = Event::new(draft(), UserId::new()) else {
            panic!("valid draft rejected");
        };
        assert_eq!(event.refresh_status(Utc::now()), None);
        assert_eq!(event.status, EventStatus::Upcoming);
    }

    #[test]
    fn refresh_never_leaves_terminal_states() {
        let Ok(mut event) = Event::new(draft(), UserId::new()) else {
            panic!("valid draft rejected");
        };
        let Ok(()) = event.cancel(Utc::now()) else {
            panic!("cancel failed");
        };
        assert_eq!(event.refresh_status(event.end_time + Duration::days(1)), None);
        assert_eq!(event.status, EventStatus::Cancelled);
    }

    #[test]
    fn transition_table_is_exhaustive() {
        use EventStatus::{Cancelled, Completed, Ongoing, Upcoming};
        assert!(Upcoming.can_transition_to(Ongoing));
        assert!(Upcoming.can_transition_to(Cancelled));
        assert!(Ongoing.can_transition_to(Completed));
        assert!(!Ongoing.can_transition_to(Upcoming));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Ongoing));
    }

    #[test]
    fn cancelled_event_is_not_bookable() {
        let Ok(mut event) = Event::new(draft(), UserId::new()) else {
            panic!("valid draft rejected");
        };
        assert!(event.is_bookable(Utc::now()));
        let Ok(()) = event.cancel(Utc::now()) else {
            panic!("cancel failed");
        };
        assert!(!event.is_bookable(Utc::now()));
    }

    #[test]
    fn editable_only_while_upcoming_before_start() {
        let Ok(mut event) = Event::new(draft(), UserId::new()) else {
            panic!("valid draft rejected");
        };
        assert!(event.is_editable(Utc::now()));
        event.refresh_status(event.start_time + Duration::minutes(1));
        assert!(!event.is_editable(event.start_time + Duration::minutes(1)));
    }
}
