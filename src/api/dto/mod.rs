//! Request and response DTOs for the REST API.

pub mod common_dto;
pub mod event_dto;
pub mod ticket_dto;

pub use common_dto::{PaginationMeta, PaginationParams};
pub use event_dto::{
    AvailabilityResponse, CancelEventRequest, CascadeFailureDto, CascadeReportResponse,
    CreateEventRequest, EventListResponse, EventResponse, EventSummaryDto, ListEventsParams,
    UpdateEventRequest,
};
pub use ticket_dto::{BookTicketRequest, CancelTicketRequest, TicketListResponse, TicketResponse};
