//! Tic-tac-toe engine - server-authoritative rules and AI
//!
//! This library owns every invariant of a two-player tic-tac-toe session.
//!
//! # Architecture
//!
//! - **Board**: immutable 3x3 grid with geometry helpers
//! - **Rules**: line and full-board predicates
//! - **Contracts**: diff-based move validation against the stored board
//! - **State**: the transition computed after every placed mark
//! - **Minimax**: exhaustive search for the AI's reply
//! - **Service**: create / join / move orchestration over a repository
//!
//! # Example
//!
//! ```
//! use tictactoe_engine::{GameSessionService, GameState, InMemorySessionRepository, MinimaxEngine};
//! use uuid::Uuid;
//!
//! # fn example() -> Result<(), tictactoe_engine::GameError> {
//! let service = GameSessionService::new(InMemorySessionRepository::new(), MinimaxEngine::new());
//! let me = Uuid::new_v4();
//!
//! let game = service.create_game(me, Some("me".to_string()), true)?;
//! let game = service.make_move(*game.id(), me, 1, 1)?;
//! assert_eq!(*game.state(), GameState::PlayerTurn(me));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod contracts;
mod error;
mod minimax;
mod position;
mod repository;
pub mod rules;
mod service;
mod session;
mod state;
mod stats;
mod types;

pub use contracts::{LegalMove, MoveViolation, PlayersTurn, SingleMarkDiff, is_legal};
pub use error::{GameError, RepositoryError};
pub use minimax::{MinimaxEngine, WIN_SCORE};
pub use position::Position;
pub use repository::{
    InMemorySessionRepository, SessionRepository, is_available_for, is_finished_for,
    is_in_progress_for,
};
pub use service::GameSessionService;
pub use session::{GameSession, Player, PlayerId, PlayerKind, SessionId};
pub use state::{GameState, advance};
pub use stats::{DEFAULT_TOP_PLAYERS, PlayerStats, top_players};
pub use types::{Board, Mark, Square};
