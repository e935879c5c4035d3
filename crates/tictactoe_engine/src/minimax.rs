//! Exhaustive minimax search for the AI player.

use crate::position::Position;
use crate::rules::has_line;
use crate::session::GameSession;
use crate::types::{Board, Mark};
use tracing::{debug, instrument};

/// Score of a won leaf before the depth penalty.
pub const WIN_SCORE: i32 = 100;

/// Full-depth minimax over the 3x3 game tree.
///
/// Leaves score `WIN_SCORE - depth` when the AI's mark has a line,
/// `depth - WIN_SCORE` when the opponent's does and `0` on a full board,
/// so faster wins and slower losses are preferred. Cells are tried in
/// row-major order and only a strictly better score replaces the current
/// best, which makes the first optimal cell the answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimaxEngine;

impl MinimaxEngine {
    /// Creates the engine.
    pub fn new() -> Self {
        Self
    }

    /// Proposes the AI's next move in `session`.
    ///
    /// Returns `None` unless the session is on the turn of an AI player
    /// and the board still has an empty square.
    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    pub fn best_move(&self, session: &GameSession) -> Option<Position> {
        let Some(player) = session.current_player().filter(|p| p.is_ai()) else {
            debug!(state = %session.state(), "Not the AI's turn");
            return None;
        };
        self.best_move_for(session.board(), *player.mark())
    }

    /// Proposes the best move for `mark` on `board`, `mark` being the side to move.
    ///
    /// Returns `None` when the position is already decided or full.
    #[instrument(skip(self, board))]
    pub fn best_move_for(&self, board: &Board, mark: Mark) -> Option<Position> {
        let (score, best) = search(board, mark, mark, 0);
        debug!(score, best = ?best, "Search finished");
        best
    }
}

/// Returns the minimax score of `board` with `to_move` on move, and the
/// first cell reaching it.
fn search(board: &Board, to_move: Mark, ai: Mark, depth: i32) -> (i32, Option<Position>) {
    if has_line(board, ai) {
        return (WIN_SCORE - depth, None);
    }
    if has_line(board, ai.opponent()) {
        return (depth - WIN_SCORE, None);
    }
    if board.is_full() {
        return (0, None);
    }

    let maximizing = to_move == ai;
    let mut best_score = if maximizing { i32::MIN } else { i32::MAX };
    let mut best = None;

    for pos in board.empty_positions() {
        let child = board.with_mark(pos, to_move);
        let (score, _) = search(&child, to_move.opponent(), ai, depth + 1);
        let improves = if maximizing {
            score > best_score
        } else {
            score < best_score
        };
        if improves {
            best_score = score;
            best = Some(pos);
        }
    }

    (best_score, best)
}
