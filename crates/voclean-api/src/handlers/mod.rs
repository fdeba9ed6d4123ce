pub mod recordings;
pub mod webhooks;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use voclean_core::constants::CALLER_ID_HEADER;

use crate::error::BadRequest;

/// Caller identity taken from the `x-caller-id` header. Authenticating that
/// identity is the surrounding application's job; this service only needs
/// the id for ownership checks.
#[derive(Debug, Clone, Copy)]
pub struct CallerId(pub Uuid);

impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = BadRequest;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CALLER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| BadRequest(format!("missing {} header", CALLER_ID_HEADER)))?;

        let caller_id = Uuid::parse_str(raw)
            .map_err(|_| BadRequest(format!("{} header is not a valid uuid", CALLER_ID_HEADER)))?;

        Ok(CallerId(caller_id))
    }
}
