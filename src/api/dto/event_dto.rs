//! Event-related DTOs for create, update, list, cancel, and availability.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::PaginationMeta;
use crate::domain::event::{Event, EventDraft, EventSummary};
use crate::domain::ledger::Availability;
use crate::service::{CascadeReport, EventUpdate};

/// Request body for `POST /events`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    /// Display title.
    pub title: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Venue or address.
    #[serde(default)]
    pub location: String,
    /// Catalog category (see `GET /config/categories`).
    pub category: String,
    /// Doors-open instant (RFC 3339).
    pub start_time: DateTime<Utc>,
    /// Doors-close instant (RFC 3339).
    pub end_time: DateTime<Utc>,
    /// Maximum sellable ticket quantity.
    pub capacity: u32,
    /// Price per ticket.
    pub unit_price: f64,
}

impl From<CreateEventRequest> for EventDraft {
    fn from(req: CreateEventRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            location: req.location,
            category: req.category,
            start_time: req.start_time,
            end_time: req.end_time,
            capacity: req.capacity,
            unit_price: req.unit_price,
        }
    }
}

/// Request body for `PUT /events/{id}`. Absent fields are untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateEventRequest {
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
    /// New capacity (never below the sold count).
    pub capacity: Option<u32>,
    /// New per-ticket price (future purchases only).
    pub unit_price: Option<f64>,
}

impl From<UpdateEventRequest> for EventUpdate {
    fn from(req: UpdateEventRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            location: req.location,
            category: req.category,
            start_time: req.start_time,
            end_time: req.end_time,
            capacity: req.capacity,
            unit_price: req.unit_price,
        }
    }
}

/// Query parameters for `GET /events`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListEventsParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Optional lifecycle-status filter
    /// (`upcoming|ongoing|completed|cancelled`).
    #[serde(default)]
    pub status: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

/// Full event detail.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventResponse {
    /// Event identifier.
    pub id: uuid::Uuid,
    /// Display title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Venue or address.
    pub location: String,
    /// Catalog category.
    pub category: String,
    /// Lifecycle status string.
    pub status: String,
    /// Doors-open instant.
    pub start_time: DateTime<Utc>,
    /// Doors-close instant.
    pub end_time: DateTime<Utc>,
    /// Maximum sellable quantity.
    pub capacity: u32,
    /// Price per ticket.
    pub unit_price: f64,
    /// Sold quantity.
    pub sold_tickets: u32,
    /// Unsold quantity.
    pub remaining: u32,
    /// Creator's user id.
    pub created_by: uuid::Uuid,
    /// Whether the event accepts bookings at all.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        let sold_tickets = event.sold_tickets();
        let remaining = event.remaining();
        Self {
            id: (*event.id.as_uuid()),
            title: event.title,
            description: event.description,
            location: event.location,
            category: event.category,
            status: event.status.as_str().to_string(),
            start_time: event.start_time,
            end_time: event.end_time,
            capacity: event.capacity,
            unit_price: event.unit_price,
            sold_tickets,
            remaining,
            created_by: (*event.created_by.as_uuid()),
            is_active: event.is_active,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

/// Event summary for list responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventSummaryDto {
    /// Event identifier.
    pub id: uuid::Uuid,
    /// Display title.
    pub title: String,
    /// Catalog category.
    pub category: String,
    /// Lifecycle status string.
    pub status: String,
    /// Doors-open instant.
    pub start_time: DateTime<Utc>,
    /// Maximum sellable quantity.
    pub capacity: u32,
    /// Sold quantity.
    pub sold_tickets: u32,
    /// Price per ticket.
    pub unit_price: f64,
}

impl From<EventSummary> for EventSummaryDto {
    fn from(summary: EventSummary) -> Self {
        Self {
            id: (*summary.id.as_uuid()),
            title: summary.title,
            category: summary.category,
            status: summary.status.as_str().to_string(),
            start_time: summary.start_time,
            capacity: summary.capacity,
            sold_tickets: summary.sold_tickets,
            unit_price: summary.unit_price,
        }
    }
}

/// Paginated list response for `GET /events`.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventListResponse {
    /// Event summaries.
    pub data: Vec<EventSummaryDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Capacity snapshot for `GET /events/{id}/availability`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityResponse {
    /// Maximum sellable quantity.
    pub capacity: u32,
    /// Sold quantity.
    pub sold_tickets: u32,
    /// Unsold quantity.
    pub remaining: u32,
}

impl From<Availability> for AvailabilityResponse {
    fn from(availability: Availability) -> Self {
        Self {
            capacity: availability.capacity,
            sold_tickets: availability.sold_tickets,
            remaining: availability.remaining,
        }
    }
}

/// Request body for `POST /events/{id}/cancel`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelEventRequest {
    /// Operator-supplied reason, propagated into every cascaded ticket.
    pub reason: String,
}

/// One failed cascade step.
#[derive(Debug, Serialize, ToSchema)]
pub struct CascadeFailureDto {
    /// Ticket the cascade failed on.
    pub ticket_id: uuid::Uuid,
    /// Failure description.
    pub error: String,
}

/// Response body for `POST /events/{id}/cancel`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CascadeReportResponse {
    /// The cancelled event.
    pub event_id: uuid::Uuid,
    /// Tickets cancelled by the cascade.
    pub cancelled: Vec<uuid::Uuid>,
    /// Tickets the cascade could not cancel.
    pub failed: Vec<CascadeFailureDto>,
}

impl From<CascadeReport> for CascadeReportResponse {
    fn from(report: CascadeReport) -> Self {
        Self {
            event_id: (*report.event_id.as_uuid()),
            cancelled: report
                .cancelled
                .into_iter()
                .map(|id| *id.as_uuid())
                .collect(),
            failed: report
                .failed
                .into_iter()
                .map(|failure| CascadeFailureDto {
                    ticket_id: (*failure.ticket_id.as_uuid()),
                    error: failure.error,
                })
                .collect(),
        }
    }
}
