//! Win detection logic for tic-tac-toe.

use crate::{Board, Mark, Position, Square};

/// The eight lines that win the game: rows, columns, diagonals.
pub const LINES: [[Position; 3]; 8] = [
    // Rows
    [Position::TopLeft, Position::TopCenter, Position::TopRight],
    [Position::MiddleLeft, Position::Center, Position::MiddleRight],
    [Position::BottomLeft, Position::BottomCenter, Position::BottomRight],
    // Columns
    [Position::TopLeft, Position::MiddleLeft, Position::BottomLeft],
    [Position::TopCenter, Position::Center, Position::BottomCenter],
    [Position::TopRight, Position::MiddleRight, Position::BottomRight],
    // Diagonals
    [Position::TopLeft, Position::Center, Position::BottomRight],
    [Position::TopRight, Position::Center, Position::BottomLeft],
];

/// Checks whether `mark` fills any row, column or diagonal.
pub fn has_line(board: &Board, mark: Mark) -> bool {
    let target = Square::Occupied(mark);
    LINES
        .iter()
        .any(|line| line.iter().all(|pos| board.get(*pos) == target))
}

/// Returns the mark holding a line, checking X before O.
pub fn winner(board: &Board) -> Option<Mark> {
    [Mark::X, Mark::O]
        .into_iter()
        .find(|mark| has_line(board, *mark))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(marks: &[(Position, Mark)]) -> Board {
        marks
            .iter()
            .fold(Board::new(), |board, (pos, mark)| board.with_mark(*pos, *mark))
    }

    #[test]
    fn test_no_winner_empty_board() {
        let board = Board::new();
        assert!(!has_line(&board, Mark::X));
        assert!(!has_line(&board, Mark::O));
        assert_eq!(winner(&board), None);
    }

    #[test]
    fn test_every_line_wins_for_either_mark() {
        for mark in [Mark::X, Mark::O] {
            for line in LINES {
                let board = board_with(&line.map(|pos| (pos, mark)));
                assert!(has_line(&board, mark), "{:?} should win on {:?}", mark, line);
                assert!(!has_line(&board, mark.opponent()));
            }
        }
    }

    #[test]
    fn test_mixed_line_is_not_a_win() {
        let board = board_with(&[
            (Position::TopLeft, Mark::X),
            (Position::TopCenter, Mark::O),
            (Position::TopRight, Mark::X),
        ]);
        assert!(!has_line(&board, Mark::X));
        assert!(!has_line(&board, Mark::O));
    }

    #[test]
    fn test_no_winner_incomplete() {
        let board = board_with(&[(Position::TopLeft, Mark::X), (Position::TopCenter, Mark::X)]);
        assert_eq!(winner(&board), None);
    }

    #[test]
    fn test_exhaustive_agreement_with_line_definition() {
        // Every board over {Empty, X, O}^9, checked against a direct scan of the triples.
        for code in 0..3usize.pow(9) {
            let mut rows = [[Square::Empty; 3]; 3];
            let mut rest = code;
            for pos in Position::ALL {
                rows[pos.row()][pos.col()] = match rest % 3 {
                    0 => Square::Empty,
                    1 => Square::Occupied(Mark::X),
                    _ => Square::Occupied(Mark::O),
                };
                rest /= 3;
            }
            let board = Board::from_rows(rows);
            for mark in [Mark::X, Mark::O] {
                let expected = LINES.iter().any(|[a, b, c]| {
                    board.get(*a) == Square::Occupied(mark)
                        && board.get(*b) == Square::Occupied(mark)
                        && board.get(*c) == Square::Occupied(mark)
                });
                assert_eq!(has_line(&board, mark), expected);
            }
        }
    }
}
