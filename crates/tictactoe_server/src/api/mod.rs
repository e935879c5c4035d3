//! REST API over the game session service.

mod error;
mod handlers;
mod identity;
pub mod wire;

pub use error::ApiError;
pub use identity::{PLAYER_ID_HEADER, PlayerIdentity};

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::routing::{get, post};
use std::sync::Arc;
use tictactoe_engine::GameSessionService;
use tower::ServiceBuilder;
use tracing::{info, instrument};

use crate::db::SqliteSessionRepository;

/// The service as the server runs it.
pub type SessionService = GameSessionService<SqliteSessionRepository>;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    service: Arc<SessionService>,
}

impl AppState {
    /// Wraps the service for sharing between requests.
    pub fn new(service: SessionService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Shared handle to the service.
    pub fn service(&self) -> Arc<SessionService> {
        Arc::clone(&self.service)
    }
}

/// Builds the application router.
#[instrument(skip(state))]
pub fn router(state: AppState) -> Router {
    info!("Building API router");
    Router::new()
        .route("/health", get(handlers::health))
        .route("/games", post(handlers::create_game))
        .route("/games/available", get(handlers::available_games))
        .route("/games/in-progress", get(handlers::in_progress_games))
        .route("/games/finished", get(handlers::finished_games))
        .route(
            "/games/{id}",
            get(handlers::get_game).delete(handlers::delete_game),
        )
        .route("/games/{id}/join", post(handlers::join_game))
        .route("/games/{id}/move", post(handlers::make_move))
        .route("/games/{id}/resume", post(handlers::resume_game))
        .route("/top-players", get(handlers::top_players))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(state)
}
