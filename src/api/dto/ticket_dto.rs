//! Ticket-related DTOs for booking, cancellation, and lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::Ticket;

/// Request body for `POST /tickets`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BookTicketRequest {
    /// Event to book against.
    pub event_id: uuid::Uuid,
    /// Number of seats to purchase. Must be at least 1.
    pub quantity: u32,
}

/// Request body for `POST /tickets/{id}/cancel`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelTicketRequest {
    /// Caller-supplied cancellation reason, kept for refund bookkeeping.
    pub reason: String,
}

/// Full ticket detail.
#[derive(Debug, Serialize, ToSchema)]
pub struct TicketResponse {
    /// Ticket identifier.
    pub id: uuid::Uuid,
    /// Owning user.
    pub user_id: uuid::Uuid,
    /// Event the tickets are for.
    pub event_id: uuid::Uuid,
    /// Seats in this purchase.
    pub quantity: u32,
    /// Price per seat, frozen at purchase time.
    pub unit_price: f64,
    /// Total price, frozen at purchase time.
    pub total_price: f64,
    /// Lifecycle status string.
    pub status: String,
    /// Unique human-presentable booking code.
    pub booking_code: String,
    /// Purchase timestamp.
    pub purchase_date: DateTime<Utc>,
    /// Cancellation timestamp, if cancelled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Cancellation reason, if cancelled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: (*ticket.id.as_uuid()),
            user_id: (*ticket.user_id.as_uuid()),
            event_id: (*ticket.event_id.as_uuid()),
            quantity: ticket.quantity,
            unit_price: ticket.unit_price,
            total_price: ticket.total_price,
            status: ticket.status.as_str().to_string(),
            booking_code: ticket.booking_code,
            purchase_date: ticket.purchase_date,
            cancelled_at: ticket.cancelled_at,
            cancel_reason: ticket.cancel_reason,
        }
    }
}

/// Paginated list response for `GET /tickets`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TicketListResponse {
    /// Tickets owned by the caller, newest purchase first.
    pub data: Vec<TicketResponse>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
