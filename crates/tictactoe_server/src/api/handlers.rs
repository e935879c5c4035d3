//! Route handlers.
//!
//! Service calls touch SQLite, so each one runs on the blocking pool.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tictactoe_engine::{DEFAULT_TOP_PLAYERS, GameError, GameSession, SessionId};
use tracing::{info, instrument};

use crate::api::wire::{
    CreateGameRequest, HealthResponse, JoinGameRequest, MoveRequest, PlayerStatsView, SessionView,
    TopPlayersQuery,
};
use crate::api::{ApiError, AppState, PlayerIdentity, SessionService};

/// Runs `op` against the service on the blocking pool.
async fn blocking<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&SessionService) -> Result<T, GameError> + Send + 'static,
{
    let service = state.service();
    tokio::task::spawn_blocking(move || op(service.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(format!("Worker failed: {}", e)))?
        .map_err(ApiError::from)
}

fn views(sessions: &[GameSession]) -> Json<Vec<SessionView>> {
    Json(sessions.iter().map(SessionView::from).collect())
}

/// Fails when the body names a different game than the path.
fn check_game_id(path: SessionId, body: Option<SessionId>) -> Result<(), ApiError> {
    match body {
        Some(body) if body != path => Err(GameError::GameIdMismatch { path, body }.into()),
        _ => Ok(()),
    }
}

/// Converts a wire coordinate, rejecting negatives as invalid moves.
fn coordinate(name: &str, value: i64) -> Result<usize, ApiError> {
    usize::try_from(value).map_err(|_| {
        GameError::InvalidMove(format!("{} {} is off the board", name, value)).into()
    })
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// `POST /games`
#[instrument(skip(state, req), fields(player = %player.0, with_ai = req.play_with_ai))]
pub async fn create_game(
    State(state): State<AppState>,
    player: PlayerIdentity,
    Json(req): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let PlayerIdentity(player_id) = player;
    let game = blocking(&state, move |service| {
        service.create_game(player_id, req.creator_name, req.play_with_ai)
    })
    .await?;
    info!(game_id = %game.id(), "Created game");
    Ok((StatusCode::CREATED, Json(SessionView::from(&game))))
}

/// `GET /games/available`
#[instrument(skip(state))]
pub async fn available_games(
    State(state): State<AppState>,
    PlayerIdentity(player_id): PlayerIdentity,
) -> Result<Json<Vec<SessionView>>, ApiError> {
    let games = blocking(&state, move |service| service.available_games(player_id)).await?;
    Ok(views(&games))
}

/// `GET /games/in-progress`
#[instrument(skip(state))]
pub async fn in_progress_games(
    State(state): State<AppState>,
    PlayerIdentity(player_id): PlayerIdentity,
) -> Result<Json<Vec<SessionView>>, ApiError> {
    let games = blocking(&state, move |service| service.in_progress_games(player_id)).await?;
    Ok(views(&games))
}

/// `GET /games/finished`
#[instrument(skip(state))]
pub async fn finished_games(
    State(state): State<AppState>,
    PlayerIdentity(player_id): PlayerIdentity,
) -> Result<Json<Vec<SessionView>>, ApiError> {
    let games = blocking(&state, move |service| service.finished_games(player_id)).await?;
    Ok(views(&games))
}

/// `GET /games/{id}`
#[instrument(skip(state, _player))]
pub async fn get_game(
    State(state): State<AppState>,
    _player: PlayerIdentity,
    Path(game_id): Path<SessionId>,
) -> Result<Json<SessionView>, ApiError> {
    let game = blocking(&state, move |service| service.get_game(game_id)).await?;
    Ok(Json(SessionView::from(&game)))
}

/// `DELETE /games/{id}`
#[instrument(skip(state))]
pub async fn delete_game(
    State(state): State<AppState>,
    PlayerIdentity(player_id): PlayerIdentity,
    Path(game_id): Path<SessionId>,
) -> Result<StatusCode, ApiError> {
    blocking(&state, move |service| service.delete_game(game_id, player_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /games/{id}/join`
#[instrument(skip(state, req))]
pub async fn join_game(
    State(state): State<AppState>,
    PlayerIdentity(player_id): PlayerIdentity,
    Path(game_id): Path<SessionId>,
    Json(req): Json<JoinGameRequest>,
) -> Result<Json<SessionView>, ApiError> {
    check_game_id(game_id, req.game_id)?;
    let game = blocking(&state, move |service| {
        service.join_game(game_id, player_id, req.player_name)
    })
    .await?;
    Ok(Json(SessionView::from(&game)))
}

/// `POST /games/{id}/move`
#[instrument(skip(state, req), fields(row = req.row, col = req.col))]
pub async fn make_move(
    State(state): State<AppState>,
    PlayerIdentity(player_id): PlayerIdentity,
    Path(game_id): Path<SessionId>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<SessionView>, ApiError> {
    check_game_id(game_id, req.game_id)?;
    let row = coordinate("Row", req.row)?;
    let col = coordinate("Column", req.col)?;
    let game = blocking(&state, move |service| {
        service.make_move(game_id, player_id, row, col)
    })
    .await?;
    Ok(Json(SessionView::from(&game)))
}

/// `POST /games/{id}/resume`
///
/// Only players of the game may trigger the owed AI reply.
#[instrument(skip(state))]
pub async fn resume_game(
    State(state): State<AppState>,
    PlayerIdentity(player_id): PlayerIdentity,
    Path(game_id): Path<SessionId>,
) -> Result<Json<SessionView>, ApiError> {
    let game = blocking(&state, move |service| {
        if !service.get_game(game_id)?.is_member(player_id) {
            return Err(GameError::Forbidden(game_id));
        }
        service.resume_ai_turn(game_id)
    })
    .await?;
    Ok(Json(SessionView::from(&game)))
}

/// `GET /top-players?limit=N`
#[instrument(skip(state, _player))]
pub async fn top_players(
    State(state): State<AppState>,
    _player: PlayerIdentity,
    Query(query): Query<TopPlayersQuery>,
) -> Result<Json<Vec<PlayerStatsView>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_PLAYERS);
    let ranked = blocking(&state, move |service| service.top_players(limit)).await?;
    Ok(Json(ranked.iter().map(PlayerStatsView::from).collect()))
}
