//! Database models and their mapping to engine sessions.

use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use tictactoe_engine::{Board, GameSession, GameState, Player, PlayerId};
use tracing::instrument;
use uuid::Uuid;

use crate::db::{DbError, schema};

/// Stored form of a [`GameSession`].
///
/// The state enum is split into a kind column and a nullable player id;
/// board and players are JSON text.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset, Identifiable)]
#[diesel(table_name = schema::sessions)]
#[diesel(treat_none_as_null = true)]
pub struct SessionRow {
    id: String,
    board: String,
    state_kind: String,
    state_player_id: Option<String>,
    players: String,
    with_ai: bool,
    created_at: NaiveDateTime,
    version: i64,
}

impl SessionRow {
    /// Encodes a session for storage.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a column cannot be encoded.
    #[instrument(skip(session), fields(session_id = %session.id()))]
    pub fn from_session(session: &GameSession) -> Result<Self, DbError> {
        let (kind, player) = StateKind::encode(session.state());
        Ok(Self {
            id: session.id().to_string(),
            board: serde_json::to_string(session.board())?,
            state_kind: kind.to_db_string().to_string(),
            state_player_id: player.map(|id| id.to_string()),
            players: serde_json::to_string(session.players())?,
            with_ai: *session.with_ai(),
            created_at: session.created_at().naive_utc(),
            version: version_to_db(*session.version())?,
        })
    }

    /// Decodes a stored row back into a session.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if any column holds a value the engine would reject.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn into_session(self) -> Result<GameSession, DbError> {
        let id = parse_uuid(&self.id)?;
        let board: Board = serde_json::from_str(&self.board)?;
        let players: Vec<Player> = serde_json::from_str(&self.players)?;
        let player_id = self.state_player_id.as_deref().map(parse_uuid).transpose()?;
        let state = StateKind::from_db_string(&self.state_kind)?.decode(player_id)?;

        if let Some(id) = state.turn().or(state.winner())
            && !players.iter().any(|p| *p.id() == id)
        {
            return Err(DbError::new(format!(
                "State of session {} names non-member {}",
                self.id, id
            )));
        }

        let version = u64::try_from(self.version)
            .map_err(|_| DbError::new(format!("Negative version {}", self.version)))?;

        Ok(GameSession::from_parts(
            id,
            board,
            state,
            players,
            self.with_ai,
            DateTime::<Utc>::from_naive_utc_and_offset(self.created_at, Utc),
            version,
        ))
    }
}

/// Discriminant of [`GameState`] as stored in `state_kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    /// `GameState::WaitingForPlayers`
    WaitingForPlayers,
    /// `GameState::PlayerTurn`
    PlayerTurn,
    /// `GameState::Draw`
    Draw,
    /// `GameState::Winner`
    Winner,
}

impl StateKind {
    /// Splits a state into its kind and player id.
    pub fn encode(state: &GameState) -> (Self, Option<PlayerId>) {
        match state {
            GameState::WaitingForPlayers => (Self::WaitingForPlayers, None),
            GameState::PlayerTurn(id) => (Self::PlayerTurn, Some(*id)),
            GameState::Draw => (Self::Draw, None),
            GameState::Winner(id) => (Self::Winner, Some(*id)),
        }
    }

    /// Rebuilds the state, requiring a player id exactly where the kind has one.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the player id is missing or unexpected.
    pub fn decode(self, player: Option<PlayerId>) -> Result<GameState, DbError> {
        match (self, player) {
            (Self::WaitingForPlayers, None) => Ok(GameState::WaitingForPlayers),
            (Self::PlayerTurn, Some(id)) => Ok(GameState::PlayerTurn(id)),
            (Self::Draw, None) => Ok(GameState::Draw),
            (Self::Winner, Some(id)) => Ok(GameState::Winner(id)),
            (kind, player) => Err(DbError::new(format!(
                "State '{}' with player {:?} is inconsistent",
                kind.to_db_string(),
                player
            ))),
        }
    }

    /// Converts the kind to the string stored in the database.
    #[instrument]
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::WaitingForPlayers => "waiting_for_players",
            Self::PlayerTurn => "player_turn",
            Self::Draw => "draw",
            Self::Winner => "winner",
        }
    }

    /// Parses the kind from the string stored in the database.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the string is not a valid kind.
    #[instrument(skip(s), fields(s = %s))]
    pub fn from_db_string(s: &str) -> Result<Self, DbError> {
        match s {
            "waiting_for_players" => Ok(Self::WaitingForPlayers),
            "player_turn" => Ok(Self::PlayerTurn),
            "draw" => Ok(Self::Draw),
            "winner" => Ok(Self::Winner),
            _ => Err(DbError::new(format!("Invalid state kind: '{}'", s))),
        }
    }
}

/// Converts a session version to the signed column type.
pub(crate) fn version_to_db(version: u64) -> Result<i64, DbError> {
    i64::try_from(version).map_err(|_| DbError::new(format!("Version {} out of range", version)))
}

fn parse_uuid(s: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::new(format!("Invalid id '{}': {}", s, e)))
}
