//! Domain events reflecting booking-state mutations.
//!
//! Every state change emits a [`TicketEvent`] through the
//! [`super::EventBus`]. Events feed the durable audit log consumed by the
//! reporting collaborator; they are not part of the transactional path.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::event::EventStatus;
use super::id::{EventId, TicketId, UserId};

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum TicketEvent {
    /// Emitted when a new event listing is created.
    EventCreated {
        /// Event identifier.
        event_id: EventId,
        /// Display title.
        title: String,
        /// Maximum sellable quantity.
        capacity: u32,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when an event is administratively cancelled.
    EventCancelled {
        /// Event identifier.
        event_id: EventId,
        /// How many booked tickets the cascade cancelled.
        cascaded_tickets: u32,
        /// Cancellation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when the lifecycle sweep advances an event's status.
    EventStatusChanged {
        /// Event identifier.
        event_id: EventId,
        /// State before the transition.
        old_status: EventStatus,
        /// State after the transition.
        new_status: EventStatus,
        /// Transition timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a successful booking.
    TicketBooked {
        /// Ticket identifier.
        ticket_id: TicketId,
        /// Event the tickets are for.
        event_id: EventId,
        /// Purchasing user.
        user_id: UserId,
        /// Seats purchased.
        quantity: u32,
        /// Frozen total price of the purchase.
        total_price: f64,
        /// Sold count after the reservation.
        sold_tickets: u32,
        /// Purchase timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a ticket is cancelled and its capacity released.
    TicketCancelled {
        /// Ticket identifier.
        ticket_id: TicketId,
        /// Event the tickets were for.
        event_id: EventId,
        /// Owning user.
        user_id: UserId,
        /// Seats released back to the event.
        quantity: u32,
        /// Caller-supplied cancellation reason.
        reason: String,
        /// Cancellation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a ticket is redeemed at check-in.
    TicketRedeemed {
        /// Ticket identifier.
        ticket_id: TicketId,
        /// Event the ticket belongs to.
        event_id: EventId,
        /// Redemption timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl TicketEvent {
    /// Returns the id of the event this domain event concerns.
    #[must_use]
    pub const fn event_id(&self) -> EventId {
        match self {
            Self::EventCreated { event_id, .. }
            | Self::EventCancelled { event_id, .. }
            | Self::EventStatusChanged { event_id, .. }
            | Self::TicketBooked { event_id, .. }
            | Self::TicketCancelled { event_id, .. }
            | Self::TicketRedeemed { event_id, .. } => *event_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::EventCreated { .. } => "event_created",
            Self::EventCancelled { .. } => "event_cancelled",
            Self::EventStatusChanged { .. } => "event_status_changed",
            Self::TicketBooked { .. } => "ticket_booked",
            Self::TicketCancelled { .. } => "ticket_cancelled",
            Self::TicketRedeemed { .. } => "ticket_redeemed",
        }
    }
}
