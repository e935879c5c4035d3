//! Session orchestration: create, join, move, and the AI reply.

use crate::contracts::LegalMove;
use crate::error::GameError;
use crate::minimax::MinimaxEngine;
use crate::position::Position;
use crate::repository::SessionRepository;
use crate::session::{GameSession, Player, PlayerId, SessionId};
use crate::state::{GameState, advance};
use crate::stats::{PlayerStats, top_players};
use crate::types::Mark;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Game session operations over a repository.
///
/// Each operation validates against the stored session before writing
/// anything. Writes go through the repository's version check, so two
/// requests racing on the same snapshot cannot both succeed.
#[derive(Debug, Clone)]
pub struct GameSessionService<R> {
    repository: R,
    engine: MinimaxEngine,
}

impl<R: SessionRepository> GameSessionService<R> {
    /// Creates the service from its collaborators.
    #[instrument(skip(repository, engine))]
    pub fn new(repository: R, engine: MinimaxEngine) -> Self {
        info!("Creating GameSessionService");
        Self { repository, engine }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Creates a session owned by `creator_id`, who plays X.
    ///
    /// With `with_ai` the AI joins as O immediately and the creator moves
    /// first; otherwise the session waits for a second player.
    #[instrument(skip(self, creator_name))]
    pub fn create_game(
        &self,
        creator_id: PlayerId,
        creator_name: Option<String>,
        with_ai: bool,
    ) -> Result<GameSession, GameError> {
        let creator = Player::human(creator_id, creator_name, Mark::X);
        let (players, state) = if with_ai {
            (vec![creator, Player::ai(Mark::O)], GameState::PlayerTurn(creator_id))
        } else {
            (vec![creator], GameState::WaitingForPlayers)
        };

        let session = GameSession::open(Uuid::new_v4(), players, state, with_ai);
        let saved = self.save(&session)?;
        info!(session_id = %saved.id(), state = %saved.state(), "Game created");
        Ok(saved)
    }

    /// Adds `joiner_id` as the second player.
    ///
    /// The joiner takes the free mark and the turn goes to the first player.
    #[instrument(skip(self, joiner_name))]
    pub fn join_game(
        &self,
        game_id: SessionId,
        joiner_id: PlayerId,
        joiner_name: Option<String>,
    ) -> Result<GameSession, GameError> {
        let session = self.load(game_id)?;

        let [first] = session.players().as_slice() else {
            warn!(players = session.players().len(), "Join rejected");
            return Err(GameError::InvalidPlayerCount(session.players().len()));
        };

        let joiner = Player::human(joiner_id, joiner_name, first.mark().opponent());
        let state = GameState::PlayerTurn(*first.id());
        let joined = session.with_player(joiner, state);

        let saved = self.save(&joined)?;
        info!(session_id = %game_id, state = %saved.state(), "Player joined");
        Ok(saved)
    }

    /// Places `player_id`'s mark at `(row, col)`.
    ///
    /// In AI games the AI replies within the same call when it is its
    /// turn. The human move is saved before the AI searches; if the
    /// second save fails, the stored session owes the AI move (see
    /// [`GameSession::ai_owes_move`]) and [`resume_ai_turn`](Self::resume_ai_turn)
    /// completes it.
    #[instrument(skip(self))]
    pub fn make_move(
        &self,
        game_id: SessionId,
        player_id: PlayerId,
        row: usize,
        col: usize,
    ) -> Result<GameSession, GameError> {
        let session = self.load(game_id)?;

        if session.state().turn() != Some(player_id) {
            warn!(state = %session.state(), "Move out of turn");
            return Err(GameError::InvalidMove(format!(
                "It is not player {}'s turn ({})",
                player_id,
                session.state()
            )));
        }
        let player = session
            .player(player_id)
            .ok_or_else(|| GameError::InvalidMove(format!("Unknown player {}", player_id)))?;
        if player.is_ai() {
            warn!("Move submitted for the AI seat");
            return Err(GameError::InvalidMove(
                "The AI seat is played by the engine".to_string(),
            ));
        }
        if !session.board().is_empty_tile(row, col) {
            warn!(row, col, "Square unavailable");
            return Err(GameError::InvalidMove(format!(
                "Square ({}, {}) is occupied or off the board",
                row, col
            )));
        }
        let pos = Position::from_row_col(row, col).ok_or_else(|| {
            GameError::InvalidMove(format!("Square ({}, {}) is off the board", row, col))
        })?;

        let moved = self.apply(&session, pos, *player.mark())?;
        let saved = self.save(&moved)?;
        info!(%pos, state = %saved.state(), "Move applied");

        if saved.ai_owes_move() {
            return self.play_ai(&saved);
        }
        Ok(saved)
    }

    /// Plays the AI move a session owes, if any.
    #[instrument(skip(self))]
    pub fn resume_ai_turn(&self, game_id: SessionId) -> Result<GameSession, GameError> {
        let session = self.load(game_id)?;
        if !session.ai_owes_move() {
            debug!("No AI move owed");
            return Ok(session);
        }
        self.play_ai(&session)
    }

    /// Loads a session.
    #[instrument(skip(self))]
    pub fn get_game(&self, game_id: SessionId) -> Result<GameSession, GameError> {
        self.load(game_id)
    }

    /// Sessions `requester` can join.
    #[instrument(skip(self))]
    pub fn available_games(&self, requester: PlayerId) -> Result<Vec<GameSession>, GameError> {
        Ok(self.repository.list_available(requester)?)
    }

    /// Running sessions `requester` plays in.
    #[instrument(skip(self))]
    pub fn in_progress_games(&self, requester: PlayerId) -> Result<Vec<GameSession>, GameError> {
        Ok(self.repository.list_in_progress(requester)?)
    }

    /// Finished sessions `requester` played in.
    #[instrument(skip(self))]
    pub fn finished_games(&self, requester: PlayerId) -> Result<Vec<GameSession>, GameError> {
        Ok(self.repository.list_finished(requester)?)
    }

    /// Deletes a session on behalf of one of its players.
    #[instrument(skip(self))]
    pub fn delete_game(&self, game_id: SessionId, requester: PlayerId) -> Result<(), GameError> {
        let session = self.load(game_id)?;
        if !session.is_member(requester) {
            warn!("Delete by non-member rejected");
            return Err(GameError::Forbidden(game_id));
        }
        self.repository.delete(game_id)?;
        info!("Game deleted");
        Ok(())
    }

    /// Best players by win ratio over all finished sessions.
    #[instrument(skip(self))]
    pub fn top_players(&self, limit: usize) -> Result<Vec<PlayerStats>, GameError> {
        let sessions = self.repository.list_all()?;
        Ok(top_players(&sessions, limit))
    }

    /// Runs the engine for an owed AI move and saves the result.
    fn play_ai(&self, session: &GameSession) -> Result<GameSession, GameError> {
        let ai_mark = session
            .current_player()
            .map(|p| *p.mark())
            .ok_or_else(|| GameError::InvalidMove("No player to move".to_string()))?;
        let Some(pos) = self.engine.best_move(session) else {
            debug!("Engine found no move");
            return Ok(session.clone());
        };

        let replied = self.apply(session, pos, ai_mark)?;
        let saved = self.save(&replied)?;
        info!(%pos, state = %saved.state(), "AI replied");
        Ok(saved)
    }

    /// Builds the next session for `mark` at `pos`, checked by the move validator.
    fn apply(&self, session: &GameSession, pos: Position, mark: Mark) -> Result<GameSession, GameError> {
        let proposed = session.board().with_mark(pos, mark);
        LegalMove::check(session, &proposed).map_err(|v| GameError::InvalidMove(v.to_string()))?;
        let state = advance(session, &proposed);
        Ok(session.with_move(proposed, state))
    }

    fn load(&self, game_id: SessionId) -> Result<GameSession, GameError> {
        self.repository
            .get(game_id)?
            .ok_or(GameError::GameNotFound(game_id))
    }

    fn save(&self, session: &GameSession) -> Result<GameSession, GameError> {
        self.repository
            .save(session)
            .map_err(|e| GameError::from_save(*session.id(), e))
    }
}
