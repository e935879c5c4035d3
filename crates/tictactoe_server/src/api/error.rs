//! Mapping of game errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use derive_more::{Display, From};
use tictactoe_engine::GameError;
use tracing::{error, warn};

use crate::api::wire::ErrorBody;

/// Error returned by API handlers.
#[derive(Debug, Display, From)]
pub enum ApiError {
    /// A failed game operation.
    #[display("{}", _0)]
    Game(GameError),
    /// The blocking worker running the operation failed.
    #[display("Internal error: {}", _0)]
    #[from(ignore)]
    Internal(String),
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Game(err) => Some(err),
            ApiError::Internal(_) => None,
        }
    }
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Game(err) => match err {
                GameError::GameNotFound(_) => StatusCode::NOT_FOUND,
                GameError::InvalidMove(_)
                | GameError::InvalidPlayerCount(_)
                | GameError::GameIdMismatch { .. } => StatusCode::BAD_REQUEST,
                GameError::AuthorizationRequired => StatusCode::UNAUTHORIZED,
                GameError::Forbidden(_) => StatusCode::FORBIDDEN,
                GameError::StaleSession(_) => StatusCode::CONFLICT,
                GameError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable camelCase name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Game(err) => match err {
                GameError::GameNotFound(_) => "gameNotFound",
                GameError::InvalidMove(_) => "invalidMove",
                GameError::InvalidPlayerCount(_) => "invalidPlayerCount",
                GameError::GameIdMismatch { .. } => "gameIdMismatch",
                GameError::AuthorizationRequired => "authorizationRequired",
                GameError::Forbidden(_) => "forbidden",
                GameError::StaleSession(_) => "staleSession",
                GameError::Repository(_) => "repository",
            },
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, status = %status, "Request rejected");
        }
        let reason = match &self {
            // Storage details stay in the log.
            ApiError::Game(GameError::Repository(_)) | ApiError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: self.kind().to_string(),
            reason,
        };
        (status, Json(body)).into_response()
    }
}
