//! Session persistence boundary and an in-memory implementation.

use crate::error::RepositoryError;
use crate::session::{GameSession, PlayerId, SessionId};
use crate::state::GameState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

/// Storage for game sessions.
///
/// `save` is a compare-and-swap upsert: it succeeds only when the stored
/// version equals `session.version()` (or nothing is stored and the
/// version is 0), and returns the session as stored with its version
/// incremented. Listings are ordered oldest first.
pub trait SessionRepository: Send + Sync {
    /// Stores `session`, failing with a stale error on a version conflict.
    fn save(&self, session: &GameSession) -> Result<GameSession, RepositoryError>;

    /// Loads a session by id.
    fn get(&self, id: SessionId) -> Result<Option<GameSession>, RepositoryError>;

    /// Sessions waiting for a second player that `requester` is not part of.
    fn list_available(&self, requester: PlayerId) -> Result<Vec<GameSession>, RepositoryError>;

    /// Sessions `requester` plays in that are on someone's turn.
    fn list_in_progress(&self, requester: PlayerId) -> Result<Vec<GameSession>, RepositoryError>;

    /// Finished sessions `requester` played in.
    fn list_finished(&self, requester: PlayerId) -> Result<Vec<GameSession>, RepositoryError>;

    /// Every stored session.
    fn list_all(&self) -> Result<Vec<GameSession>, RepositoryError>;

    /// Removes a session; removing a missing session is not an error.
    fn delete(&self, id: SessionId) -> Result<(), RepositoryError>;
}

/// Which listing a session belongs to.
pub fn is_available_for(session: &GameSession, requester: PlayerId) -> bool {
    *session.state() == GameState::WaitingForPlayers && !session.is_member(requester)
}

/// Whether `requester` is playing `session` and it is still running.
pub fn is_in_progress_for(session: &GameSession, requester: PlayerId) -> bool {
    matches!(session.state(), GameState::PlayerTurn(_)) && session.is_member(requester)
}

/// Whether `requester` played `session` and it has ended.
pub fn is_finished_for(session: &GameSession, requester: PlayerId) -> bool {
    session.is_terminal() && session.is_member(requester)
}

/// Thread-safe in-memory session store.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<Mutex<HashMap<SessionId, GameSession>>>,
}

impl InMemorySessionRepository {
    /// Creates an empty repository.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory session repository");
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, GameSession>>, RepositoryError> {
        self.sessions
            .lock()
            .map_err(|e| RepositoryError::new(format!("Session map poisoned: {}", e)))
    }

    fn filtered(
        &self,
        keep: impl Fn(&GameSession) -> bool,
    ) -> Result<Vec<GameSession>, RepositoryError> {
        let sessions = self.lock()?;
        let mut found: Vec<GameSession> = sessions.values().filter(|s| keep(s)).cloned().collect();
        found.sort_by_key(|s| (*s.created_at(), *s.id()));
        Ok(found)
    }
}

impl SessionRepository for InMemorySessionRepository {
    #[instrument(skip(self, session), fields(session_id = %session.id(), version = session.version()))]
    fn save(&self, session: &GameSession) -> Result<GameSession, RepositoryError> {
        let mut sessions = self.lock()?;
        let stored_version = sessions.get(session.id()).map(|s| *s.version());

        let current = stored_version.unwrap_or(0);
        if current != *session.version() {
            warn!(?stored_version, "Version conflict");
            return Err(RepositoryError::stale(
                *session.id(),
                *session.version(),
                stored_version,
            ));
        }

        let saved = session.clone().with_version(current + 1);
        sessions.insert(*saved.id(), saved.clone());
        debug!(version = saved.version(), "Session saved");
        Ok(saved)
    }

    #[instrument(skip(self))]
    fn get(&self, id: SessionId) -> Result<Option<GameSession>, RepositoryError> {
        let session = self.lock()?.get(&id).cloned();
        if session.is_none() {
            debug!("Session not found");
        }
        Ok(session)
    }

    #[instrument(skip(self))]
    fn list_available(&self, requester: PlayerId) -> Result<Vec<GameSession>, RepositoryError> {
        self.filtered(|s| is_available_for(s, requester))
    }

    #[instrument(skip(self))]
    fn list_in_progress(&self, requester: PlayerId) -> Result<Vec<GameSession>, RepositoryError> {
        self.filtered(|s| is_in_progress_for(s, requester))
    }

    #[instrument(skip(self))]
    fn list_finished(&self, requester: PlayerId) -> Result<Vec<GameSession>, RepositoryError> {
        self.filtered(|s| is_finished_for(s, requester))
    }

    #[instrument(skip(self))]
    fn list_all(&self) -> Result<Vec<GameSession>, RepositoryError> {
        self.filtered(|_| true)
    }

    #[instrument(skip(self))]
    fn delete(&self, id: SessionId) -> Result<(), RepositoryError> {
        if self.lock()?.remove(&id).is_some() {
            info!("Session deleted");
        }
        Ok(())
    }
}
