//! HTTP tests for the REST API.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::NamedTempFile;
use tictactoe_engine::{GameSessionService, MinimaxEngine};
use tictactoe_server::{AppState, PLAYER_ID_HEADER, SqliteSessionRepository, router, run_migrations};
use tower::ServiceExt;
use uuid::Uuid;

fn setup_app() -> (NamedTempFile, Router) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    run_migrations(&db_path).expect("Migrations failed");

    let repo = SqliteSessionRepository::new(db_path).expect("Failed to create repository");
    let service = GameSessionService::new(repo, MinimaxEngine::new());
    (db_file, router(AppState::new(service)))
}

/// Sends a request and returns the status and parsed JSON body (`Null` when empty).
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    player: Option<Uuid>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(player) = player {
        builder = builder.header(PLAYER_ID_HEADER, player.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request"),
        None => builder.body(Body::empty()).expect("Failed to build request"),
    };

    let response = app.clone().oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Body is not JSON")
    };
    (status, value)
}

fn game_id(body: &Value) -> String {
    body["id"].as_str().expect("Missing game id").to_string()
}

#[tokio::test]
async fn test_health_needs_no_identity() {
    let (_db, app) = setup_app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_identity_is_401() {
    let (_db, app) = setup_app();
    let (status, body) = send(&app, "GET", "/games/available", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authorizationRequired");

    let request = Request::builder()
        .uri("/games/available")
        .header(PLAYER_ID_HEADER, "not-a-uuid")
        .body(Body::empty())
        .expect("Failed to build request");
    let response = app.clone().oneshot(request).await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_join_and_win() {
    let (_db, app) = setup_app();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let (status, created) = send(
        &app,
        "POST",
        "/games",
        Some(alice),
        Some(json!({"creatorName": "alice", "playWithAi": false})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["state"], json!({"type": "waitingForPlayers"}));
    assert_eq!(created["board"], json!([[0, 0, 0], [0, 0, 0], [0, 0, 0]]));
    assert_eq!(created["players"][0]["mark"], "X");
    assert_eq!(created["withAi"], false);
    assert_eq!(created["aiMovePending"], false);
    let id = game_id(&created);

    let (status, available) = send(&app, "GET", "/games/available", Some(bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(available.as_array().map(Vec::len), Some(1));

    let (status, joined) = send(
        &app,
        "POST",
        &format!("/games/{}/join", id),
        Some(bob),
        Some(json!({"gameId": id, "playerName": "bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        joined["state"],
        json!({"type": "playerTurn", "playerId": alice.to_string()})
    );
    assert_eq!(joined["players"][1]["mark"], "O");

    let moves = [(alice, 0, 0), (bob, 1, 0), (alice, 0, 1), (bob, 1, 1), (alice, 0, 2)];
    let mut last = Value::Null;
    for (player, row, col) in moves {
        let (status, body) = send(
            &app,
            "POST",
            &format!("/games/{}/move", id),
            Some(player),
            Some(json!({"row": row, "col": col})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "Move ({}, {}) failed: {}", row, col, body);
        last = body;
    }
    assert_eq!(
        last["state"],
        json!({"type": "winner", "playerId": alice.to_string()})
    );
    assert_eq!(last["board"], json!([[1, 1, 1], [2, 2, 0], [0, 0, 0]]));

    let (status, finished) = send(&app, "GET", "/games/finished", Some(bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(finished.as_array().map(Vec::len), Some(1));

    let (status, ranked) = send(&app, "GET", "/top-players?limit=1", Some(bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ranked[0]["playerId"], alice.to_string());
    assert_eq!(ranked[0]["winRatio"], 1.0);
    assert_eq!(ranked.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_ai_game_replies_in_same_request() {
    let (_db, app) = setup_app();
    let me = Uuid::new_v4();

    let (_, created) = send(
        &app,
        "POST",
        "/games",
        Some(me),
        Some(json!({"playWithAi": true})),
    )
    .await;
    let id = game_id(&created);
    assert_eq!(created["players"][1]["ai"], true);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/games/{}/move", id),
        Some(me),
        Some(json!({"row": 0, "col": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["board"], json!([[1, 0, 0], [0, 2, 0], [0, 0, 0]]));
    assert_eq!(
        body["state"],
        json!({"type": "playerTurn", "playerId": me.to_string()})
    );

    let (status, resumed) = send(
        &app,
        "POST",
        &format!("/games/{}/resume", id),
        Some(me),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resumed["version"], body["version"]);
}

#[tokio::test]
async fn test_unknown_game_is_404() {
    let (_db, app) = setup_app();
    let (status, body) = send(
        &app,
        "GET",
        &format!("/games/{}", Uuid::new_v4()),
        Some(Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "gameNotFound");
}

#[tokio::test]
async fn test_bad_requests_are_400() {
    let (_db, app) = setup_app();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let (_, created) = send(&app, "POST", "/games", Some(alice), Some(json!({}))).await;
    let id = game_id(&created);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/games/{}/join", id),
        Some(bob),
        Some(json!({"gameId": Uuid::new_v4()})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "gameIdMismatch");

    send(&app, "POST", &format!("/games/{}/join", id), Some(bob), Some(json!({}))).await;

    for (player, row, col) in [(bob, 0, 0), (alice, -1, 0), (alice, 0, 3)] {
        let (status, body) = send(
            &app,
            "POST",
            &format!("/games/{}/move", id),
            Some(player),
            Some(json!({"row": row, "col": col})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalidMove");
    }

    let (status, body) = send(
        &app,
        "POST",
        &format!("/games/{}/join", id),
        Some(Uuid::new_v4()),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalidPlayerCount");
}

#[tokio::test]
async fn test_delete_is_for_members_only() {
    let (_db, app) = setup_app();
    let alice = Uuid::new_v4();
    let (_, created) = send(&app, "POST", "/games", Some(alice), Some(json!({}))).await;
    let uri = format!("/games/{}", game_id(&created));

    let (status, body) = send(&app, "DELETE", &uri, Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = send(&app, "DELETE", &uri, Some(alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &uri, Some(alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
