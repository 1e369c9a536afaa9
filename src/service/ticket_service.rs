//! Ticket service: the booking engine and the cancellation handler.
//!
//! Every mutation follows the same pattern: acquire the event's write
//! lock, mutate counter and record inside that one critical section,
//! drop the lock, then emit events. The reservation and the ticket row
//! therefore commit together. A failed insert path releases the
//! reservation before the lock drops, so no other task ever observes
//! reserved capacity without a matching ticket, or vice versa.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::ledger::{self, Availability};
use crate::domain::{
    BookingCodeGenerator, EntityRegistry, EventBus, EventId, EventStatus, Ticket, TicketEvent,
    TicketId, UserId,
};
use crate::error::BoxofficeError;

/// Bounded retry ceiling for booking-code collisions.
const MAX_CODE_ATTEMPTS: u32 = 5;

/// Orchestration layer for ticket purchases and reversals.
#[derive(Debug, Clone)]
pub struct TicketService {
    registry: Arc<EntityRegistry>,
    code_generator: BookingCodeGenerator,
    event_bus: EventBus,
}

impl TicketService {
    /// Creates a new `TicketService`.
    #[must_use]
    pub fn new(registry: Arc<EntityRegistry>, event_bus: EventBus) -> Self {
        Self {
            registry,
            code_generator: BookingCodeGenerator::new(),
            event_bus,
        }
    }

    /// Returns a reference to the inner [`EntityRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<EntityRegistry> {
        &self.registry
    }

    /// Books `quantity` tickets on an event for `user_id`.
    ///
    /// Validates eligibility, reserves capacity, freezes the price,
    /// generates a collision-free booking code, and persists the ticket,
    /// all under the event's write lock.
    ///
    /// # Errors
    ///
    /// - [`BoxofficeError::InvalidRequest`] if `quantity` is zero.
    /// - [`BoxofficeError::EventNotFound`] if the event does not exist.
    /// - [`BoxofficeError::EventUnavailable`] if the event is inactive,
    ///   ended, or in a non-sellable state.
    /// - [`BoxofficeError::CapacityExceeded`] with the remaining count if
    ///   the event cannot absorb `quantity`.
    /// - [`BoxofficeError::EngineBusy`] if code generation exhausted its
    ///   retry budget (the reservation is rolled back).
    pub async fn book_ticket(
        &self,
        event_id: EventId,
        user_id: UserId,
        quantity: u32,
    ) -> Result<Ticket, BoxofficeError> {
        if quantity == 0 {
            return Err(BoxofficeError::InvalidRequest(
                "quantity must be at least 1".to_string(),
            ));
        }

        let slot = self.registry.event(event_id).await?;
        let mut event = slot.write().await;

        let now = Utc::now();
        let transition = event.refresh_status(now);
        if !event.is_bookable(now) {
            let status = event.status;
            drop(event);
            self.publish_transition(event_id, transition);
            return Err(BoxofficeError::EventUnavailable(format!(
                "event {event_id} is not open for booking (status: {status})"
            )));
        }

        if let Err(err) = ledger::reserve(&mut event, quantity) {
            drop(event);
            self.publish_transition(event_id, transition);
            return Err(err);
        }
        let unit_price = event.unit_price;

        let mut attempts = 0;
        let inserted = loop {
            let code = self.code_generator.generate(user_id);
            let ticket = Ticket::new(user_id, event_id, quantity, unit_price, code);
            match self.registry.insert_ticket(ticket.clone()).await {
                Ok(()) => break Ok(ticket),
                Err(BoxofficeError::CodeCollision(code)) => {
                    attempts += 1;
                    if attempts >= MAX_CODE_ATTEMPTS {
                        break Err(BoxofficeError::EngineBusy(format!(
                            "booking code generation failed after {MAX_CODE_ATTEMPTS} attempts"
                        )));
                    }
                    tracing::warn!(%event_id, %code, attempts, "booking code collision, regenerating");
                }
                Err(err) => break Err(err),
            }
        };

        let ticket = match inserted {
            Ok(ticket) => ticket,
            Err(err) => {
                // Reservation must not outlive a failed ticket write.
                ledger::release(&mut event, quantity);
                return Err(err);
            }
        };
        let sold_tickets = event.sold_tickets();
        drop(event);

        self.publish_transition(event_id, transition);
        let _ = self.event_bus.publish(TicketEvent::TicketBooked {
            ticket_id: ticket.id,
            event_id,
            user_id,
            quantity,
            total_price: ticket.total_price,
            sold_tickets,
            timestamp: now,
        });

        tracing::info!(
            ticket_id = %ticket.id,
            %event_id,
            %user_id,
            quantity,
            booking_code = %ticket.booking_code,
            "ticket booked"
        );
        Ok(ticket)
    }

    /// Cancels a booked ticket and releases its capacity.
    ///
    /// The release and the ticket mutation commit under the same event
    /// write lock (lock order: event first, then ticket, everywhere).
    ///
    /// # Errors
    ///
    /// - [`BoxofficeError::TicketNotFound`] if the ticket does not exist.
    /// - [`BoxofficeError::Unauthorized`] if `user_id` does not own it.
    /// - [`BoxofficeError::InvalidState`] if the ticket is not `Booked`
    ///   (double-cancel and cancel-after-use fail here, without touching
    ///   the counter).
    pub async fn cancel_ticket(
        &self,
        ticket_id: TicketId,
        user_id: UserId,
        reason: String,
    ) -> Result<Ticket, BoxofficeError> {
        let ticket_slot = self.registry.ticket(ticket_id).await?;

        // user_id and event_id are immutable, safe to read outside the
        // critical section.
        let (owner, event_id) = {
            let ticket = ticket_slot.read().await;
            (ticket.user_id, ticket.event_id)
        };
        if owner != user_id {
            return Err(BoxofficeError::Unauthorized(format!(
                "ticket {ticket_id} belongs to another user"
            )));
        }

        let event_slot = self.registry.event(event_id).await?;
        let mut event = event_slot.write().await;
        let mut ticket = ticket_slot.write().await;

        let now = Utc::now();
        ticket.cancel(now, reason.clone())?;
        ledger::release(&mut event, ticket.quantity);

        let quantity = ticket.quantity;
        let snapshot = ticket.clone();
        drop(ticket);
        drop(event);

        let _ = self.event_bus.publish(TicketEvent::TicketCancelled {
            ticket_id,
            event_id,
            user_id,
            quantity,
            reason,
            timestamp: now,
        });

        tracing::info!(%ticket_id, %event_id, %user_id, quantity, "ticket cancelled");
        Ok(snapshot)
    }

    /// Redeems a ticket at check-in (`Booked -> Used`).
    ///
    /// Capacity is untouched: a used ticket still counts as sold.
    ///
    /// # Errors
    ///
    /// Returns [`BoxofficeError::TicketNotFound`] or
    /// [`BoxofficeError::InvalidState`].
    pub async fn redeem_ticket(&self, ticket_id: TicketId) -> Result<Ticket, BoxofficeError> {
        let slot = self.registry.ticket(ticket_id).await?;
        let mut ticket = slot.write().await;
        ticket.redeem()?;
        let snapshot = ticket.clone();
        drop(ticket);

        let _ = self.event_bus.publish(TicketEvent::TicketRedeemed {
            ticket_id,
            event_id: snapshot.event_id,
            timestamp: Utc::now(),
        });

        tracing::info!(%ticket_id, "ticket redeemed");
        Ok(snapshot)
    }

    /// Returns the capacity snapshot for an event.
    ///
    /// # Errors
    ///
    /// Returns [`BoxofficeError::EventNotFound`] if the event does not
    /// exist.
    pub async fn availability(&self, event_id: EventId) -> Result<Availability, BoxofficeError> {
        let slot = self.registry.event(event_id).await?;
        let event = slot.read().await;
        Ok(ledger::availability(&event))
    }

    /// Returns a snapshot of one ticket.
    ///
    /// # Errors
    ///
    /// Returns [`BoxofficeError::TicketNotFound`] if the ticket does not
    /// exist.
    pub async fn ticket(&self, ticket_id: TicketId) -> Result<Ticket, BoxofficeError> {
        let slot = self.registry.ticket(ticket_id).await?;
        let ticket = slot.read().await;
        Ok(ticket.clone())
    }

    /// Returns all tickets owned by `user_id`, newest purchase first.
    pub async fn tickets_for_user(&self, user_id: UserId) -> Vec<Ticket> {
        self.registry.tickets_for_user(user_id).await
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
