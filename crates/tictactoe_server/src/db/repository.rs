//! SQLite-backed session repository.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tictactoe_engine::{
    GameSession, PlayerId, RepositoryError, SessionId, SessionRepository, is_available_for,
    is_finished_for, is_in_progress_for,
};
use tracing::{debug, info, instrument, warn};

use crate::db::models::{StateKind, version_to_db};
use crate::db::{DbError, SessionRow, schema};

/// Milliseconds a connection waits on a locked database before failing.
pub const BUSY_TIMEOUT_MS: u32 = 5000;

/// Session storage in a SQLite database.
///
/// Each call opens its own connection, so the repository is cheap to
/// clone and safe to share between blocking tasks. Connections run in WAL
/// mode with a busy timeout, so readers proceed alongside a writer and
/// writers queue instead of failing. Saves are compare-and-swap on the
/// `version` column.
#[derive(Debug, Clone)]
pub struct SqliteSessionRepository {
    db_path: String,
}

impl SqliteSessionRepository {
    /// Creates a repository for the database at the given path.
    ///
    /// The schema must already be migrated (see [`run_migrations`](crate::db::run_migrations)).
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database cannot be opened.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        info!(path = %db_path, "Creating SqliteSessionRepository");
        let repository = Self { db_path };
        repository.connection()?;
        Ok(repository)
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))?;
        configure(&mut conn)?;
        Ok(conn)
    }

    /// Loads one row by id.
    fn find_row(&self, id: SessionId) -> Result<Option<SessionRow>, DbError> {
        let mut conn = self.connection()?;
        let row = schema::sessions::table
            .find(id.to_string())
            .select(SessionRow::as_select())
            .first::<SessionRow>(&mut conn)
            .optional()?;
        Ok(row)
    }

    /// Overwrites the row for `id` if it still holds version `expected`.
    fn update_row(
        &self,
        conn: &mut SqliteConnection,
        id: SessionId,
        expected: u64,
        row: &SessionRow,
    ) -> Result<usize, DbError> {
        let updated = diesel::update(
            schema::sessions::table
                .filter(schema::sessions::id.eq(id.to_string()))
                .filter(schema::sessions::version.eq(version_to_db(expected)?)),
        )
        .set(row)
        .execute(conn)?;
        Ok(updated)
    }

    /// Deletes the row for `id`, returning how many rows went away.
    fn delete_row(&self, id: SessionId) -> Result<usize, DbError> {
        let mut conn = self.connection()?;
        let deleted = diesel::delete(schema::sessions::table.find(id.to_string())).execute(&mut conn)?;
        Ok(deleted)
    }

    /// Version currently stored for `id`, if any.
    fn stored_version(
        &self,
        conn: &mut SqliteConnection,
        id: SessionId,
    ) -> Result<Option<u64>, DbError> {
        let version = schema::sessions::table
            .find(id.to_string())
            .select(schema::sessions::version)
            .first::<i64>(conn)
            .optional()?;
        Ok(version.and_then(|v| u64::try_from(v).ok()))
    }

    /// Loads and decodes every row, oldest first, keeping those `keep` accepts.
    fn load_where(
        &self,
        kind: Option<StateKind>,
        keep: impl Fn(&GameSession) -> bool,
    ) -> Result<Vec<GameSession>, DbError> {
        let mut conn = self.connection()?;

        let mut query = schema::sessions::table
            .select(SessionRow::as_select())
            .order((schema::sessions::created_at.asc(), schema::sessions::id.asc()))
            .into_boxed();
        if let Some(kind) = kind {
            query = query.filter(schema::sessions::state_kind.eq(kind.to_db_string()));
        }

        let rows = query.load::<SessionRow>(&mut conn)?;
        let mut sessions = Vec::with_capacity(rows.len());
        for row in rows {
            let session = row.into_session()?;
            if keep(&session) {
                sessions.push(session);
            }
        }
        debug!(count = sessions.len(), "Sessions loaded");
        Ok(sessions)
    }
}

/// Applies per-connection settings: busy timeout first, then WAL.
fn configure(conn: &mut SqliteConnection) -> Result<(), DbError> {
    conn.batch_execute(&format!(
        "PRAGMA busy_timeout = {}; PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;",
        BUSY_TIMEOUT_MS
    ))
    .map_err(|e| DbError::new(format!("Failed to configure connection: {}", e)))
}

impl SessionRepository for SqliteSessionRepository {
    #[instrument(skip(self, session), fields(session_id = %session.id(), version = session.version()))]
    fn save(&self, session: &GameSession) -> Result<GameSession, RepositoryError> {
        let id = *session.id();
        let expected = *session.version();
        let saved = session.clone().with_version(expected + 1);
        let row = SessionRow::from_session(&saved)?;
        let mut conn = self.connection()?;

        if expected == 0 {
            match diesel::insert_into(schema::sessions::table)
                .values(&row)
                .execute(&mut conn)
            {
                Ok(_) => {}
                Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                    let found = self.stored_version(&mut conn, id)?;
                    warn!(?found, "Insert over existing session");
                    return Err(RepositoryError::stale(id, expected, found));
                }
                Err(e) => return Err(DbError::from(e).into()),
            }
        } else {
            let updated = self.update_row(&mut conn, id, expected, &row)?;

            if updated == 0 {
                let found = self.stored_version(&mut conn, id)?;
                warn!(?found, "Version conflict");
                return Err(RepositoryError::stale(id, expected, found));
            }
        }

        debug!(version = saved.version(), "Session saved");
        Ok(saved)
    }

    #[instrument(skip(self))]
    fn get(&self, id: SessionId) -> Result<Option<GameSession>, RepositoryError> {
        match self.find_row(id)? {
            Some(row) => Ok(Some(row.into_session()?)),
            None => {
                debug!("Session not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    fn list_available(&self, requester: PlayerId) -> Result<Vec<GameSession>, RepositoryError> {
        Ok(self.load_where(Some(StateKind::WaitingForPlayers), |s| {
            is_available_for(s, requester)
        })?)
    }

    #[instrument(skip(self))]
    fn list_in_progress(&self, requester: PlayerId) -> Result<Vec<GameSession>, RepositoryError> {
        Ok(self.load_where(Some(StateKind::PlayerTurn), |s| {
            is_in_progress_for(s, requester)
        })?)
    }

    #[instrument(skip(self))]
    fn list_finished(&self, requester: PlayerId) -> Result<Vec<GameSession>, RepositoryError> {
        Ok(self.load_where(None, |s| is_finished_for(s, requester))?)
    }

    #[instrument(skip(self))]
    fn list_all(&self) -> Result<Vec<GameSession>, RepositoryError> {
        Ok(self.load_where(None, |_| true)?)
    }

    #[instrument(skip(self))]
    fn delete(&self, id: SessionId) -> Result<(), RepositoryError> {
        if self.delete_row(id)? > 0 {
            info!("Session deleted");
        }
        Ok(())
    }
}
