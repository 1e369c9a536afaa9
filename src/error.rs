//! Engine error types with HTTP status code mapping.
//!
//! [`BoxofficeError`] is the central error type for the service. Each
//! variant maps to a specific HTTP status code and structured JSON error
//! response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "message": "capacity exceeded: requested 3, only 2 left",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`BoxofficeError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status                  |
/// |-----------|---------------------|------------------------------|
/// | 1000–1999 | Validation          | 400 Bad Request              |
/// | 2000–2999 | Not Found / State   | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server / Transient  | 500 / 503                    |
/// | 4000–4999 | Booking Domain      | 422 / 403                    |
#[derive(Debug, thiserror::Error)]
pub enum BoxofficeError {
    /// Event with the given ID was not found.
    #[error("event not found: {0}")]
    EventNotFound(uuid::Uuid),

    /// Ticket with the given ID was not found.
    #[error("ticket not found: {0}")]
    TicketNotFound(uuid::Uuid),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Event exists but is not open for the attempted operation
    /// (inactive, past its end, or in a closed lifecycle state).
    #[error("event unavailable: {0}")]
    EventUnavailable(String),

    /// The event cannot absorb the requested quantity.
    #[error("capacity exceeded: requested {requested}, only {remaining} left")]
    CapacityExceeded {
        /// Quantity the caller asked for.
        requested: u32,
        /// Quantity still available at the time of the check.
        remaining: u32,
    },

    /// Caller does not own the resource they are operating on.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The entity is in a lifecycle state that forbids the transition
    /// (double-cancel, cancel-after-use, cancel of a closed event).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A generated booking code already exists. Internal signal: the
    /// booking engine regenerates and retries; never surfaced raw.
    #[error("booking code collision: {0}")]
    CodeCollision(String),

    /// Bounded internal retries were exhausted; the whole operation may
    /// be retried by the caller.
    #[error("engine busy: {0}")]
    EngineBusy(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BoxofficeError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::EventNotFound(_) => 2001,
            Self::TicketNotFound(_) => 2002,
            Self::EventUnavailable(_) => 2101,
            Self::InvalidState(_) => 2102,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::EngineBusy(_) => 3002,
            Self::CodeCollision(_) => 3003,
            Self::CapacityExceeded { .. } => 4001,
            Self::Unauthorized(_) => 4002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::EventNotFound(_) | Self::TicketNotFound(_) => StatusCode::NOT_FOUND,
            Self::EventUnavailable(_) | Self::InvalidState(_) => StatusCode::CONFLICT,
            Self::CapacityExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::EngineBusy(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::CodeCollision(_) | Self::PersistenceError(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for BoxofficeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn capacity_exceeded_message_carries_remaining() {
        let err = BoxofficeError::CapacityExceeded {
            requested: 3,
            remaining: 2,
        };
        assert_eq!(
            err.to_string(),
            "capacity exceeded: requested 3, only 2 left"
        );
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_code(), 4001);
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = BoxofficeError::EventNotFound(uuid::Uuid::new_v4());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_state_maps_to_conflict() {
        let err = BoxofficeError::InvalidState("only booked tickets can be cancelled".to_string());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_busy_maps_to_503() {
        let err = BoxofficeError::EngineBusy("code generation exhausted".to_string());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
