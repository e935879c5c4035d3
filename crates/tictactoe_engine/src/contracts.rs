//! Move legality, checked by diffing a proposed board against the
//! authoritative one.

use crate::position::Position;
use crate::session::{GameSession, PlayerId};
use crate::types::{Board, Mark, Square};
use tracing::{instrument, warn};

/// Why a proposed board is not a legal next board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum MoveViolation {
    /// The session is not waiting on any player's move.
    #[display("Session is not on a player's turn")]
    NotAPlayerTurn,

    /// The player whose turn it is does not belong to the session.
    #[display("Player {} is not part of this session", _0)]
    UnknownPlayer(PlayerId),

    /// A previously occupied square was changed.
    #[display("Square {} was already occupied", _0)]
    OverwrittenSquare(Position),

    /// An empty square received the wrong mark.
    #[display("Square {} received {} but the mover plays {}", _0, _1, _2)]
    WrongMark(Position, Mark, Mark),

    /// The board did not change.
    #[display("No square was changed")]
    NoChange,

    /// More than one square changed.
    #[display("{} squares changed; exactly one is allowed", _0)]
    TooManyChanges(usize),
}

impl std::error::Error for MoveViolation {}

/// Precondition: the session is on some player's turn and that player exists.
pub struct PlayersTurn;

impl PlayersTurn {
    /// Returns the mark of the player to move.
    pub fn check(current: &GameSession) -> Result<Mark, MoveViolation> {
        let mover = current.state().turn().ok_or(MoveViolation::NotAPlayerTurn)?;
        current
            .player(mover)
            .map(|p| *p.mark())
            .ok_or(MoveViolation::UnknownPlayer(mover))
    }
}

/// Diff rule: exactly one square goes from empty to the mover's mark and
/// no occupied square changes.
pub struct SingleMarkDiff;

impl SingleMarkDiff {
    /// Returns the single changed position.
    pub fn check(before: &Board, after: &Board, mover: Mark) -> Result<Position, MoveViolation> {
        let mut changed = Vec::with_capacity(1);
        for pos in Position::ALL {
            match (before.get(pos), after.get(pos)) {
                (old, new) if old == new => {}
                (Square::Occupied(_), _) => return Err(MoveViolation::OverwrittenSquare(pos)),
                (Square::Empty, Square::Occupied(mark)) if mark == mover => changed.push(pos),
                (Square::Empty, Square::Occupied(mark)) => {
                    return Err(MoveViolation::WrongMark(pos, mark, mover));
                }
                (Square::Empty, Square::Empty) => {}
            }
        }

        match changed.as_slice() {
            [] => Err(MoveViolation::NoChange),
            [pos] => Ok(*pos),
            many => Err(MoveViolation::TooManyChanges(many.len())),
        }
    }
}

/// Composite validator for a proposed board.
pub struct LegalMove;

impl LegalMove {
    /// Validates `proposed` as the next board of `current`, returning the played position.
    #[instrument(skip(current, proposed), fields(session_id = %current.id()))]
    pub fn check(current: &GameSession, proposed: &Board) -> Result<Position, MoveViolation> {
        let mover = PlayersTurn::check(current)?;
        SingleMarkDiff::check(current.board(), proposed, mover).inspect_err(|violation| {
            warn!(%violation, "Proposed board rejected");
        })
    }
}

/// Whether `proposed` is a legal next board for `current`.
pub fn is_legal(current: &GameSession, proposed: &Board) -> bool {
    LegalMove::check(current, proposed).is_ok()
}
