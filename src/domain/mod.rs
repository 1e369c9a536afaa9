//! Domain layer: entities, capacity ledger, registry, and event system.
//!
//! This module contains the reservation engine's core model: typed ids,
//! the event and ticket records with their lifecycle state machines, the
//! capacity ledger guarding the sold counter, booking-code generation,
//! the event bus for broadcasting state changes, and the entity registry
//! for concurrent storage.

pub mod booking_code;
pub mod event;
pub mod event_bus;
pub mod id;
pub mod ledger;
pub mod registry;
pub mod ticket;
pub mod ticket_event;

pub use booking_code::BookingCodeGenerator;
pub use event::{Event, EventStatus};
pub use event_bus::EventBus;
pub use id::{EventId, TicketId, UserId};
pub use registry::EntityRegistry;
pub use ticket::{Ticket, TicketStatus};
pub use ticket_event::TicketEvent;
