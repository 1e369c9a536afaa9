//! Booking code generation.
//!
//! Codes are short, human-presentable, and globally unique: support staff
//! read them over the phone and they are printed on the ticket itself.
//! Format: `BK-<4 hex chars from the purchaser id>-<10 hex chars of fresh
//! randomness>`. The 40-bit random suffix makes collisions negligible at
//! any realistic ticket volume; uniqueness is still enforced as a hard
//! constraint by the registry's code index, and the booking engine treats
//! a collision there as a signal to regenerate, not as a fatal error.

use super::id::UserId;

/// Stateless generator for ticket booking codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingCodeGenerator;

impl BookingCodeGenerator {
    /// Creates a generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Produces a fresh code for a purchase by `user_id`.
    ///
    /// Each call draws new randomness, so retrying after a collision
    /// yields a different code.
    #[must_use]
    pub fn generate(&self, user_id: UserId) -> String {
        let prefix = hex_chars(user_id.as_uuid().as_bytes(), 2);
        let suffix = hex_chars(uuid::Uuid::new_v4().as_bytes(), 5);
        format!("BK-{prefix}-{suffix}")
    }
}

/// Uppercase hex encoding of the first `n` bytes.
fn hex_chars(bytes: &[u8; 16], n: usize) -> String {
    bytes.iter().take(n).map(|b| format!("{b:02X}")).collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn code_has_expected_shape() {
        let code = BookingCodeGenerator::new().generate(UserId::new());
        assert_eq!(code.len(), 18); // "BK-" + 4 + "-" + 10
        assert!(code.starts_with("BK-"));
        assert!(
            code.chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
        );
    }

    #[test]
    fn prefix_is_stable_per_user() {
        let generator = BookingCodeGenerator::new();
        let user = UserId::new();
        let a = generator.generate(user);
        let b = generator.generate(user);
        assert_eq!(a.get(..7), b.get(..7));
    }

    #[test]
    fn suffix_varies_between_calls() {
        let generator = BookingCodeGenerator::new();
        let user = UserId::new();
        let codes: HashSet<String> = (0..1000).map(|_| generator.generate(user)).collect();
        assert_eq!(codes.len(), 1000);
    }
}
