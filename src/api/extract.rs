//! Caller identity extractor.
//!
//! Authentication lives in the upstream gateway; by the time a request
//! reaches this service it carries a verified user id in the `x-user-id`
//! header. The extractor only parses that header, it never
//! re-authenticates.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::UserId;
use crate::error::BoxofficeError;

/// Name of the header carrying the verified caller id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Verified identity of the calling user.
#[derive(Debug, Clone, Copy)]
pub struct CallerId(pub UserId);

impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = BoxofficeError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                BoxofficeError::Unauthorized(format!("missing {USER_ID_HEADER} header"))
            })?;
        let uuid = uuid::Uuid::parse_str(raw).map_err(|_| {
            BoxofficeError::Unauthorized(format!("malformed {USER_ID_HEADER} header"))
        })?;
        Ok(Self(UserId::from_uuid(uuid)))
    }
}
