//! JSON request and response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tictactoe_engine::{
    Board, GameSession, GameState, Mark, Player, PlayerId, PlayerStats, SessionId, Square,
};

/// Board cell codes on the wire.
pub const EMPTY_CELL: u8 = 0;
/// Cell holding X.
pub const X_CELL: u8 = 1;
/// Cell holding O.
pub const O_CELL: u8 = 2;

/// Body of `POST /games`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    /// Display name of the creator.
    #[serde(default)]
    pub creator_name: Option<String>,
    /// Whether the AI takes the second seat.
    #[serde(default)]
    pub play_with_ai: bool,
}

/// Body of `POST /games/{id}/join`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGameRequest {
    /// Must match the path id when present.
    #[serde(default)]
    pub game_id: Option<SessionId>,
    /// Display name of the joiner.
    #[serde(default)]
    pub player_name: Option<String>,
}

/// Body of `POST /games/{id}/move`.
///
/// Coordinates are signed so that negative values reach validation
/// instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    /// Must match the path id when present.
    #[serde(default)]
    pub game_id: Option<SessionId>,
    /// Row, 0..=2.
    pub row: i64,
    /// Column, 0..=2.
    pub col: i64,
}

/// Query of `GET /top-players`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopPlayersQuery {
    /// Maximum number of entries.
    pub limit: Option<usize>,
}

/// Session state with its player, tagged by `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StateView {
    /// Waiting for a second player.
    WaitingForPlayers,
    /// The player to move.
    PlayerTurn {
        /// Player to move.
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    /// Full board, nobody won.
    Draw,
    /// The player who completed a line.
    Winner {
        /// Winning player.
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
}

impl From<&GameState> for StateView {
    fn from(state: &GameState) -> Self {
        match *state {
            GameState::WaitingForPlayers => Self::WaitingForPlayers,
            GameState::PlayerTurn(player_id) => Self::PlayerTurn { player_id },
            GameState::Draw => Self::Draw,
            GameState::Winner(player_id) => Self::Winner { player_id },
        }
    }
}

/// A seated player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    /// Player id.
    pub id: PlayerId,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `"X"` or `"O"`.
    pub mark: Mark,
    /// Whether the engine plays this seat.
    pub ai: bool,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            id: *player.id(),
            name: player.name().clone(),
            mark: *player.mark(),
            ai: player.is_ai(),
        }
    }
}

/// A session as clients see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Session id.
    pub id: SessionId,
    /// Rows of cell codes.
    pub board: [[u8; 3]; 3],
    /// Current state.
    pub state: StateView,
    /// Players in join order.
    pub players: Vec<PlayerView>,
    /// Whether the AI plays the second seat.
    pub with_ai: bool,
    /// Creation time, RFC 3339.
    pub created_at: DateTime<Utc>,
    /// Optimistic concurrency counter.
    pub version: u64,
    /// The AI owes its reply; `POST /games/{id}/resume` completes it.
    pub ai_move_pending: bool,
}

impl From<&GameSession> for SessionView {
    fn from(session: &GameSession) -> Self {
        Self {
            id: *session.id(),
            board: board_codes(session.board()),
            state: StateView::from(session.state()),
            players: session.players().iter().map(PlayerView::from).collect(),
            with_ai: *session.with_ai(),
            created_at: *session.created_at(),
            version: *session.version(),
            ai_move_pending: session.ai_owes_move(),
        }
    }
}

/// Encodes the board as rows of cell codes.
pub fn board_codes(board: &Board) -> [[u8; 3]; 3] {
    board.rows().map(|row| {
        row.map(|square| match square {
            Square::Empty => EMPTY_CELL,
            Square::Occupied(Mark::X) => X_CELL,
            Square::Occupied(Mark::O) => O_CELL,
        })
    })
}

/// One leaderboard entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatsView {
    /// Ranked player.
    pub player_id: PlayerId,
    /// Last known display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Finished games counted.
    pub games: u32,
    /// Games won.
    pub wins: u32,
    /// `wins / games`.
    pub win_ratio: f64,
}

impl From<&PlayerStats> for PlayerStatsView {
    fn from(stats: &PlayerStats) -> Self {
        Self {
            player_id: *stats.player_id(),
            name: stats.name().clone(),
            games: *stats.games(),
            wins: *stats.wins(),
            win_ratio: stats.win_ratio(),
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error kind in camelCase, e.g. `"invalidMove"`.
    pub error: String,
    /// Human-readable reason.
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tictactoe_engine::Position;
    use uuid::Uuid;

    #[test]
    fn test_board_codes() {
        let board = Board::new()
            .with_mark(Position::TopLeft, Mark::X)
            .with_mark(Position::BottomRight, Mark::O);
        assert_eq!(board_codes(&board), [[1, 0, 0], [0, 0, 0], [0, 0, 2]]);
    }

    #[test]
    fn test_state_shape() {
        let id = Uuid::new_v4();
        let turn = serde_json::to_value(StateView::from(&GameState::PlayerTurn(id)))
            .expect("Serialize failed");
        assert_eq!(turn, json!({"type": "playerTurn", "playerId": id}));

        let waiting = serde_json::to_value(StateView::from(&GameState::WaitingForPlayers))
            .expect("Serialize failed");
        assert_eq!(waiting, json!({"type": "waitingForPlayers"}));
    }

    #[test]
    fn test_move_request_accepts_missing_game_id() {
        let req: MoveRequest =
            serde_json::from_value(json!({"row": -1, "col": 2})).expect("Deserialize failed");
        assert_eq!(req.game_id, None);
        assert_eq!(req.row, -1);
    }
}
