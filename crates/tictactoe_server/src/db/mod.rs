//! Database persistence layer for game sessions.

mod error;
mod models;
mod repository;
mod schema;

pub use error::DbError;
pub use models::{SessionRow, StateKind};
pub use repository::SqliteSessionRepository;

use diesel::{Connection, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{info, instrument};

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applies pending migrations to the database at `db_path`, creating it if needed.
///
/// # Errors
///
/// Returns [`DbError`] if the database cannot be opened or a migration fails.
#[instrument(skip(db_path), fields(db_path = %db_path))]
pub fn run_migrations(db_path: &str) -> Result<(), DbError> {
    let mut conn = SqliteConnection::establish(db_path)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DbError::new(format!("Migration failed: {}", e)))?;
    info!(applied = applied.len(), "Migrations complete");
    Ok(())
}
