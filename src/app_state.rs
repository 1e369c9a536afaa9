//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::{EventService, TicketService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event listing and lifecycle operations.
    pub event_service: Arc<EventService>,
    /// Booking and cancellation operations.
    pub ticket_service: Arc<TicketService>,
    /// Event bus backing the audit log.
    pub event_bus: EventBus,
}
