//! Ticket record and its lifecycle.
//!
//! Tickets are never deleted: cancellation is a terminal, non-destructive
//! state kept for refund bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{EventId, TicketId, UserId};
use crate::error::BoxofficeError;

/// Lifecycle state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Live purchase counting against event capacity.
    Booked,
    /// Cancelled by its owner (or by an event-wide cascade). Terminal.
    Cancelled,
    /// Redeemed at check-in. Terminal; still counts against capacity.
    Used,
}

impl TicketStatus {
    /// Returns the status as its wire string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Booked => "booked",
            Self::Cancelled => "cancelled",
            Self::Used => "used",
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purchased block of tickets for one event.
///
/// `unit_price` is frozen at purchase time and never re-read from the
/// event, so later price changes cannot drift into refund math.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique ticket identifier.
    pub id: TicketId,
    /// Purchasing user. Immutable.
    pub user_id: UserId,
    /// Event the tickets are for. Immutable.
    pub event_id: EventId,
    /// Number of seats in this purchase. Positive.
    pub quantity: u32,
    /// Price per seat, snapshotted from the event at purchase time.
    pub unit_price: f64,
    /// `quantity * unit_price`, fixed at purchase time.
    pub total_price: f64,
    /// Current lifecycle state.
    pub status: TicketStatus,
    /// Globally unique human-presentable code. Immutable.
    pub booking_code: String,
    /// Purchase timestamp.
    pub purchase_date: DateTime<Utc>,
    /// Set exactly once, when the ticket is cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Caller-supplied reason; present iff the ticket is cancelled.
    pub cancel_reason: Option<String>,
}

impl Ticket {
    /// Creates a `Booked` ticket with the price frozen at `unit_price`.
    #[must_use]
    pub fn new(
        user_id: UserId,
        event_id: EventId,
        quantity: u32,
        unit_price: f64,
        booking_code: String,
    ) -> Self {
        Self {
            id: TicketId::new(),
            user_id,
            event_id,
            quantity,
            unit_price,
            total_price: f64::from(quantity) * unit_price,
            status: TicketStatus::Booked,
            booking_code,
            purchase_date: Utc::now(),
            cancelled_at: None,
            cancel_reason: None,
        }
    }

    /// Transitions the ticket to `Cancelled`.
    ///
    /// # Errors
    ///
    /// Returns [`BoxofficeError::InvalidState`] unless the ticket is
    /// currently `Booked`; this is what makes double-cancel fail cleanly
    /// instead of double-releasing capacity.
    pub fn cancel(&mut self, now: DateTime<Utc>, reason: String) -> Result<(), BoxofficeError> {
        if self.status != TicketStatus::Booked {
            return Err(BoxofficeError::InvalidState(format!(
                "only booked tickets can be cancelled (ticket is {})",
                self.status
            )));
        }
        self.status = TicketStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.cancel_reason = Some(reason);
        Ok(())
    }

    /// Transitions the ticket to `Used` (check-in).
    ///
    /// # Errors
    ///
    /// Returns [`BoxofficeError::InvalidState`] unless the ticket is
    /// currently `Booked`.
    pub fn redeem(&mut self) -> Result<(), BoxofficeError> {
        if self.status != TicketStatus::Booked {
            return Err(BoxofficeError::InvalidState(format!(
                "only booked tickets can be redeemed (ticket is {})",
                self.status
            )));
        }
        self.status = TicketStatus::Used;
        Ok(())
    }
}
