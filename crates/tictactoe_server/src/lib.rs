//! Tic-tac-toe server - SQLite persistence and REST API
//!
//! Plumbing around [`tictactoe_engine`]: sessions are stored through
//! diesel and exposed as JSON over axum. Every request names its player
//! in the `x-player-id` header.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
pub mod cli;
pub mod config;
pub mod db;

pub use api::{ApiError, AppState, PLAYER_ID_HEADER, PlayerIdentity, SessionService, router};
pub use config::{ConfigError, ServerConfig};
pub use db::{DbError, SqliteSessionRepository, run_migrations};
