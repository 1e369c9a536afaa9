//! Capacity ledger: the only writer of `Event::sold_tickets`.
//!
//! The counter field is private to the domain layer, so every mutation of
//! sold quantity in the crate goes through [`reserve`] or [`release`].
//! Both require `&mut Event`, which callers can only obtain while holding
//! the event's write lock in the
//! [`EntityRegistry`](super::registry::EntityRegistry). That lock is what
//! makes the check-and-increment indivisible across concurrent callers for
//! the same event. Different events live behind different locks and never
//! contend.

use serde::Serialize;

use super::event::Event;
use crate::error::BoxofficeError;

/// Point-in-time capacity readout for one event.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Availability {
    /// Maximum sellable quantity.
    pub capacity: u32,
    /// Currently sold quantity.
    pub sold_tickets: u32,
    /// `capacity - sold_tickets`.
    pub remaining: u32,
}

/// Atomic check-and-increment of the sold counter.
///
/// Increments `sold_tickets` by `quantity` iff the result stays within
/// capacity; otherwise leaves the event untouched.
///
/// # Errors
///
/// Returns [`BoxofficeError::CapacityExceeded`] with the remaining count
/// when the event cannot absorb `quantity` more tickets.
pub fn reserve(event: &mut Event, quantity: u32) -> Result<(), BoxofficeError> {
    let remaining = event.remaining();
    if quantity > remaining {
        return Err(BoxofficeError::CapacityExceeded {
            requested: quantity,
            remaining,
        });
    }
    event.sold_tickets += quantity;
    Ok(())
}

/// Decrements the sold counter by `quantity`, clamped at zero.
///
/// The clamp is unreachable while the ledger invariant holds; it exists so
/// a corrupted counter can never underflow. Release can only lower the
/// counter, so it can never push it above capacity. Returns the new sold
/// quantity.
pub fn release(event: &mut Event, quantity: u32) -> u32 {
    event.sold_tickets = event.sold_tickets.saturating_sub(quantity);
    event.sold_tickets
}

/// Returns the current capacity snapshot for an event.
#[must_use]
pub fn availability(event: &Event) -> Availability {
    Availability {
        capacity: event.capacity,
        sold_tickets: event.sold_tickets,
        remaining: event.remaining(),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::event::EventDraft;
    use crate::domain::id::UserId;
    use chrono::{Duration, Utc};

    fn event(capacity: u32) -> Event {
        let draft = EventDraft {
            title: "Open Air".to_string(),
            description: String::new(),
            location: "Lido".to_string(),
            category: "concert".to_string(),
            start_time: Utc::now() + Duration::days(1),
            end_time: Utc::now() + Duration::days(2),
            capacity,
            unit_price: 10.0,
        };
        let Ok(event) = Event::new(draft, UserId::new()) else {
            panic!("valid draft rejected");
        };
        event
    }

    #[test]
    fn reserve_within_capacity_increments() {
        let mut e = event(10);
        let Ok(()) = reserve(&mut e, 4) else {
            panic!("reserve failed");
        };
        assert_eq!(e.sold_tickets(), 4);
        assert_eq!(e.remaining(), 6);
    }

    #[test]
    fn reserve_to_exact_capacity_succeeds() {
        let mut e = event(10);
        let Ok(()) = reserve(&mut e, 10) else {
            panic!("reserve failed");
        };
        assert_eq!(e.remaining(), 0);
    }

    #[test]
    fn reserve_beyond_capacity_fails_without_mutating() {
        let mut e = event(10);
        let Ok(()) = reserve(&mut e, 8) else {
            panic!("reserve failed");
        };
        let err = reserve(&mut e, 3);
        let Err(BoxofficeError::CapacityExceeded {
            requested,
            remaining,
        }) = err
        else {
            panic!("expected CapacityExceeded");
        };
        assert_eq!(requested, 3);
        assert_eq!(remaining, 2);
        assert_eq!(e.sold_tickets(), 8);
    }

    #[test]
    fn release_reverses_reserve_exactly() {
        let mut e = event(10);
        let Ok(()) = reserve(&mut e, 7) else {
            panic!("reserve failed");
        };
        assert_eq!(release(&mut e, 7), 0);
        assert_eq!(e.sold_tickets(), 0);
    }

    #[test]
    fn release_clamps_at_zero() {
        let mut e = event(10);
        let Ok(()) = reserve(&mut e, 2) else {
            panic!("reserve failed");
        };
        assert_eq!(release(&mut e, 5), 0);
    }

    #[test]
    fn availability_reflects_counter() {
        let mut e = event(10);
        let Ok(()) = reserve(&mut e, 6) else {
            panic!("reserve failed");
        };
        let a = availability(&e);
        assert_eq!(a.capacity, 10);
        assert_eq!(a.sold_tickets, 6);
        assert_eq!(a.remaining, 4);
    }
}
