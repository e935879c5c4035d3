//! Error types for session operations.

use crate::session::SessionId;
use derive_more::{Display, Error};
use tracing::instrument;

/// Storage failure with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Repository error: {} at {}:{}", message, file, line)]
pub struct RepositoryError {
    /// Error message.
    pub message: String,
    /// Whether the write lost an optimistic concurrency race.
    pub stale: bool,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl RepositoryError {
    /// Creates a new repository error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            stale: false,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// A save against a version that is no longer current.
    #[track_caller]
    pub fn stale(id: SessionId, expected: u64, found: Option<u64>) -> Self {
        let found = found.map_or_else(|| "nothing".to_string(), |v| format!("version {}", v));
        Self {
            stale: true,
            ..Self::new(format!(
                "Session {} changed concurrently: saving over version {}, found {}",
                id, expected, found
            ))
        }
    }
}

/// Failure of a game session operation.
#[derive(Debug, Clone, Display)]
pub enum GameError {
    /// No session with this id exists.
    #[display("Game {} not found", _0)]
    GameNotFound(SessionId),

    /// Wrong turn, occupied or out-of-range square, illegal board diff, or finished game.
    #[display("Invalid move: {}", _0)]
    InvalidMove(String),

    /// Join attempted on a session that does not have exactly one player.
    #[display("Game already has {} players", _0)]
    InvalidPlayerCount(usize),

    /// The id in the path and the id in the body disagree.
    #[display("Game ID in path ({}) and body ({}) mismatch", path, body)]
    GameIdMismatch {
        /// Id taken from the request path.
        path: SessionId,
        /// Id taken from the request body.
        body: SessionId,
    },

    /// No requester identity was supplied.
    #[display("Player identity required")]
    AuthorizationRequired,

    /// The requester is not a member of the session.
    #[display("Player is not part of game {}", _0)]
    Forbidden(SessionId),

    /// The session changed between read and write.
    #[display("Game {} was modified concurrently; reload and retry", _0)]
    StaleSession(SessionId),

    /// The repository failed.
    #[display("{}", _0)]
    Repository(RepositoryError),
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GameError::Repository(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepositoryError> for GameError {
    fn from(err: RepositoryError) -> Self {
        GameError::Repository(err)
    }
}

impl GameError {
    /// Maps a failed save of `id`, separating lost races from storage failures.
    pub fn from_save(id: SessionId, err: RepositoryError) -> Self {
        if err.stale {
            GameError::StaleSession(id)
        } else {
            GameError::Repository(err)
        }
    }
}
