//! Game rules for tic-tac-toe.
//!
//! Pure functions over a [`Board`](crate::Board), kept apart from the
//! session types so the validator, state machine and AI share them.

pub mod draw;
pub mod win;

pub use draw::{is_draw, is_full};
pub use win::{has_line, winner};
