//! Session state and the transition run after every placed mark.

use crate::rules::{has_line, is_draw};
use crate::session::{GameSession, PlayerId};
use crate::types::{Board, Mark};
use tracing::{debug, instrument};

/// Where a session stands.
///
/// - `WaitingForPlayers`: exactly one player registered
/// - `PlayerTurn(id)`: two players, `id` is one of them
/// - `Draw`: full board without a line
/// - `Winner(id)`: a line of `id`'s mark exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum GameState {
    /// Waiting for a second player to join.
    #[display("waiting for players")]
    WaitingForPlayers,
    /// The given player is to move.
    #[display("turn of {}", _0)]
    PlayerTurn(PlayerId),
    /// Full board, nobody won.
    #[display("draw")]
    Draw,
    /// The given player completed a line.
    #[display("won by {}", _0)]
    Winner(PlayerId),
}

impl GameState {
    /// Whether no further move can be made.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameState::Draw | GameState::Winner(_))
    }

    /// The player to move, if any.
    pub fn turn(&self) -> Option<PlayerId> {
        match self {
            GameState::PlayerTurn(id) => Some(*id),
            _ => None,
        }
    }

    /// The winning player, if any.
    pub fn winner(&self) -> Option<PlayerId> {
        match self {
            GameState::Winner(id) => Some(*id),
            _ => None,
        }
    }
}

/// Computes the state that follows placing a mark on `session`.
///
/// `board_after_move` is the board with the new mark. X's line is
/// checked before O's; turn order follows the join order of players,
/// wrapping around. Sessions that are terminal or still waiting keep
/// their state.
#[instrument(skip(session, board_after_move), fields(session_id = %session.id(), state = %session.state()))]
pub fn advance(session: &GameSession, board_after_move: &Board) -> GameState {
    let current = *session.state();
    let current_player = match current {
        GameState::PlayerTurn(id) => id,
        other => {
            debug!("State is not a turn; leaving it unchanged");
            return other;
        }
    };

    for mark in [Mark::X, Mark::O] {
        if has_line(board_after_move, mark)
            && let Some(winner) = session.player_with_mark(mark)
        {
            debug!(%mark, winner = %winner.id(), "Line completed");
            return GameState::Winner(*winner.id());
        }
    }

    if is_draw(board_after_move) {
        debug!("Board full without a line");
        return GameState::Draw;
    }

    let players = session.players();
    let next = players
        .iter()
        .position(|p| *p.id() == current_player)
        .map(|index| *players[(index + 1) % players.len()].id())
        .unwrap_or(current_player);

    debug!(next = %next, "Turn passes");
    GameState::PlayerTurn(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Player, Position};
    use uuid::Uuid;

    fn session(state_of: impl Fn(PlayerId, PlayerId) -> GameState) -> (GameSession, PlayerId, PlayerId) {
        let x = Uuid::new_v4();
        let o = Uuid::new_v4();
        let session = GameSession::open(
            Uuid::new_v4(),
            vec![Player::human(x, None, Mark::X), Player::human(o, None, Mark::O)],
            state_of(x, o),
            false,
        );
        (session, x, o)
    }

    fn board_from(marks: &[(Position, Mark)]) -> Board {
        marks
            .iter()
            .fold(Board::new(), |board, (pos, mark)| board.with_mark(*pos, *mark))
    }

    #[test]
    fn test_turn_passes_in_join_order() {
        let (s, _, o) = session(|x, _| GameState::PlayerTurn(x));
        let board = board_from(&[(Position::Center, Mark::X)]);
        assert_eq!(advance(&s, &board), GameState::PlayerTurn(o));

        let (s, x, _) = session(|_, o| GameState::PlayerTurn(o));
        let board = board.with_mark(Position::TopLeft, Mark::O);
        assert_eq!(advance(&s, &board), GameState::PlayerTurn(x));
    }

    #[test]
    fn test_turn_order_ignores_mark_value() {
        // O joined first, so O's holder comes first in turn order.
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let s = GameSession::open(
            Uuid::new_v4(),
            vec![Player::human(first, None, Mark::O), Player::human(second, None, Mark::X)],
            GameState::PlayerTurn(second),
            false,
        );
        let board = board_from(&[(Position::TopLeft, Mark::X)]);
        assert_eq!(advance(&s, &board), GameState::PlayerTurn(first));
    }

    #[test]
    fn test_line_produces_winner() {
        let (s, x, _) = session(|x, _| GameState::PlayerTurn(x));
        let board = board_from(&[
            (Position::TopLeft, Mark::X),
            (Position::TopCenter, Mark::X),
            (Position::TopRight, Mark::X),
            (Position::Center, Mark::O),
            (Position::BottomLeft, Mark::O),
        ]);
        assert_eq!(advance(&s, &board), GameState::Winner(x));
    }

    #[test]
    fn test_o_line_produces_o_winner() {
        let (s, _, o) = session(|_, o| GameState::PlayerTurn(o));
        let board = board_from(&[
            (Position::TopRight, Mark::O),
            (Position::Center, Mark::O),
            (Position::BottomLeft, Mark::O),
            (Position::TopLeft, Mark::X),
            (Position::TopCenter, Mark::X),
            (Position::BottomRight, Mark::X),
        ]);
        assert_eq!(advance(&s, &board), GameState::Winner(o));
    }

    #[test]
    fn test_full_board_without_line_is_draw() {
        let (s, _, _) = session(|x, _| GameState::PlayerTurn(x));
        let marks = [
            Mark::X, Mark::O, Mark::X,
            Mark::X, Mark::O, Mark::O,
            Mark::O, Mark::X, Mark::X,
        ];
        let board = Position::ALL
            .iter()
            .zip(marks)
            .fold(Board::new(), |b, (pos, mark)| b.with_mark(*pos, mark));
        assert_eq!(advance(&s, &board), GameState::Draw);
    }

    #[test]
    fn test_terminal_state_is_idempotent() {
        let board = board_from(&[
            (Position::TopLeft, Mark::X),
            (Position::Center, Mark::X),
            (Position::BottomRight, Mark::X),
        ]);
        let (s, x, _) = session(|x, _| GameState::Winner(x));
        assert_eq!(advance(&s, &board), GameState::Winner(x));
        assert_eq!(advance(&s, &board), advance(&s, &board));

        let (drawn, _, _) = session(|_, _| GameState::Draw);
        assert_eq!(advance(&drawn, &board), GameState::Draw);
    }

    #[test]
    fn test_waiting_session_is_not_advanced() {
        let only = Uuid::new_v4();
        let s = GameSession::open(
            Uuid::new_v4(),
            vec![Player::human(only, None, Mark::X)],
            GameState::WaitingForPlayers,
            false,
        );
        let board = board_from(&[(Position::Center, Mark::X)]);
        assert_eq!(advance(&s, &board), GameState::WaitingForPlayers);
    }
}
