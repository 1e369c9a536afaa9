//! Service layer: booking, cancellation, and event lifecycle orchestration.

pub mod event_service;
pub mod ticket_service;

pub use event_service::{CascadeFailure, CascadeReport, EventService, EventUpdate};
pub use ticket_service::TicketService;
