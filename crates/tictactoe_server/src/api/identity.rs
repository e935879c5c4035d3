//! Requester identity extraction.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tictactoe_engine::{GameError, PlayerId};
use tracing::debug;
use uuid::Uuid;

use crate::api::ApiError;

/// Header carrying the authenticated player id.
pub const PLAYER_ID_HEADER: &str = "x-player-id";

/// The player making the request.
///
/// Authentication happens upstream; the id arrives as a UUID in the
/// [`PLAYER_ID_HEADER`] header. A missing or malformed header is rejected
/// with `AuthorizationRequired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerIdentity(pub PlayerId);

impl<S> FromRequestParts<S> for PlayerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(PLAYER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok());

        match id {
            Some(id) => Ok(Self(id)),
            None => {
                debug!("Request without a valid player id");
                Err(GameError::AuthorizationRequired.into())
            }
        }
    }
}
