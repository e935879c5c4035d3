//! Game session values: players, state and board.

use crate::state::GameState;
use crate::types::{Board, Mark};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

/// Unique identifier for a game session.
pub type SessionId = Uuid;

/// Unique identifier for a player.
pub type PlayerId = Uuid;

/// Who controls a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    /// A person submitting moves.
    Human,
    /// The built-in minimax opponent.
    Ai,
}

/// A player in a game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct Player {
    /// Player's unique ID.
    id: PlayerId,
    /// Display name, if the player gave one.
    name: Option<String>,
    /// Which mark this player places.
    mark: Mark,
    /// Human or AI.
    kind: PlayerKind,
}

impl Player {
    /// Creates a human player.
    pub fn human(id: PlayerId, name: Option<String>, mark: Mark) -> Self {
        Self::new(id, name, mark, PlayerKind::Human)
    }

    /// Creates an AI player with a fresh id.
    pub fn ai(mark: Mark) -> Self {
        Self::new(Uuid::new_v4(), Some("AI".to_string()), mark, PlayerKind::Ai)
    }

    /// Whether the minimax engine moves for this player.
    pub fn is_ai(&self) -> bool {
        self.kind == PlayerKind::Ai
    }
}

/// One game instance.
///
/// Sessions are immutable values; every transition returns a new
/// session. `version` counts successful saves and is bumped by the
/// repository, never by the core.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct GameSession {
    /// Session ID.
    id: SessionId,
    /// Authoritative board.
    board: Board,
    /// Current state.
    state: GameState,
    /// Players in join order.
    players: Vec<Player>,
    /// Whether the second player is the AI. Fixed at creation.
    with_ai: bool,
    /// Creation time.
    created_at: DateTime<Utc>,
    /// Optimistic concurrency counter.
    version: u64,
}

impl GameSession {
    /// Opens a new, never-saved session.
    #[instrument(skip(players), fields(players = players.len()))]
    pub fn open(id: SessionId, players: Vec<Player>, state: GameState, with_ai: bool) -> Self {
        Self {
            id,
            board: Board::new(),
            state,
            players,
            with_ai,
            created_at: Utc::now(),
            version: 0,
        }
    }

    /// Reassembles a session from stored parts.
    pub fn from_parts(
        id: SessionId,
        board: Board,
        state: GameState,
        players: Vec<Player>,
        with_ai: bool,
        created_at: DateTime<Utc>,
        version: u64,
    ) -> Self {
        Self {
            id,
            board,
            state,
            players,
            with_ai,
            created_at,
            version,
        }
    }

    /// Returns this session as stored under `version`.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Returns the session after a move: the new board and the state it led to.
    pub(crate) fn with_move(&self, board: Board, state: GameState) -> Self {
        Self {
            board,
            state,
            ..self.clone()
        }
    }

    /// Returns the session with one more player and the given state.
    pub(crate) fn with_player(&self, player: Player, state: GameState) -> Self {
        let mut players = self.players.clone();
        players.push(player);
        Self {
            players,
            state,
            ..self.clone()
        }
    }

    /// Gets the player with the given ID.
    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// Gets the player holding `mark`.
    pub fn player_with_mark(&self, mark: Mark) -> Option<&Player> {
        self.players.iter().find(|p| p.mark == mark)
    }

    /// Whether `player_id` takes part in this session.
    pub fn is_member(&self, player_id: PlayerId) -> bool {
        self.player(player_id).is_some()
    }

    /// The AI-controlled player, if any.
    pub fn ai_player(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_ai())
    }

    /// The player whose turn it is.
    pub fn current_player(&self) -> Option<&Player> {
        self.state.turn().and_then(|id| self.player(id))
    }

    /// Whether the game has ended.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// True when the AI is to move but has not replied yet.
    ///
    /// Sessions are only ever stored in this state between the human
    /// save and the AI save of one move, or after the second save failed.
    pub fn ai_owes_move(&self) -> bool {
        self.with_ai && self.current_player().is_some_and(Player::is_ai)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_player_session() -> (GameSession, PlayerId, PlayerId) {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let session = GameSession::open(
            Uuid::new_v4(),
            vec![
                Player::human(first, Some("P1".to_string()), Mark::X),
                Player::human(second, None, Mark::O),
            ],
            GameState::PlayerTurn(first),
            false,
        );
        (session, first, second)
    }

    #[test]
    fn test_lookup_by_id_and_mark() {
        let (session, first, second) = two_player_session();
        assert_eq!(*session.player(first).map(Player::mark).unwrap(), Mark::X);
        assert_eq!(*session.player_with_mark(Mark::O).unwrap().id(), second);
        assert!(session.is_member(second));
        assert!(!session.is_member(Uuid::new_v4()));
        assert_eq!(*session.current_player().unwrap().id(), first);
    }

    #[test]
    fn test_new_session_is_unsaved() {
        let (session, _, _) = two_player_session();
        assert_eq!(*session.version(), 0);
        assert_eq!(*session.board(), Board::new());
        assert!(!session.ai_owes_move());
    }

    #[test]
    fn test_ai_owes_move_only_on_ai_turn() {
        let human = Uuid::new_v4();
        let ai = Player::ai(Mark::O);
        let ai_id = *ai.id();
        let session = GameSession::open(
            Uuid::new_v4(),
            vec![Player::human(human, None, Mark::X), ai],
            GameState::PlayerTurn(human),
            true,
        );
        assert!(!session.ai_owes_move());

        let owed = session.with_move(*session.board(), GameState::PlayerTurn(ai_id));
        assert!(owed.ai_owes_move());

        let finished = session.with_move(*session.board(), GameState::Draw);
        assert!(!finished.ai_owes_move());
    }
}
