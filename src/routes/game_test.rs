use axum::extract::{Query, State};
use serde_json::json;

use super::*;
use crate::state::test_helpers::{memory_state, pid, seed_lobby};

fn action(value: serde_json::Value) -> GameAction {
    serde_json::from_value(value).expect("valid action payload")
}

// =============================================================================
// WIRE FORMAT
// =============================================================================

#[test]
fn action_tags_are_camel_case() {
    assert!(matches!(
        action(json!({"action": "create"})),
        GameAction::Create { player_id: None }
    ));
    assert!(matches!(
        action(json!({"action": "playAgain", "gameId": "A", "playerId": "p"})),
        GameAction::PlayAgain { .. }
    ));
    assert!(matches!(
        action(json!({"action": "submitClue", "gameId": "A", "playerId": "p", "clue": "x"})),
        GameAction::SubmitClue { .. }
    ));
    assert!(matches!(
        action(json!({
            "action": "updateSettings", "gameId": "A", "playerId": "p",
            "settings": {"timerEnabled": false}
        })),
        GameAction::UpdateSettings { .. }
    ));
}

#[test]
fn guess_lock_in_defaults_to_false() {
    let parsed = action(json!({
        "action": "guess", "gameId": "A", "playerId": "p", "hue": 3, "chroma": 4
    }));
    let GameAction::Guess { hue, chroma, lock_in, .. } = parsed else {
        panic!("expected guess action");
    };
    assert_eq!((hue, chroma), (3, 4));
    assert!(!lock_in);
}

#[test]
fn envelope_omits_absent_fields() {
    let json = serde_json::to_value(GameResponse::gone()).unwrap();
    assert_eq!(json, json!({"success": true}));

    let mut failure = GameResponse::failure("Game not found");
    failure.code = Some("E_GAME_NOT_FOUND");
    let json = serde_json::to_value(failure).unwrap();
    assert_eq!(
        json,
        json!({"success": false, "error": "Game not found", "code": "E_GAME_NOT_FOUND"})
    );
}

// =============================================================================
// DISPATCH
// =============================================================================

#[tokio::test]
async fn unknown_actions_get_a_400() {
    let state = memory_state();
    let (status, Json(resp)) =
        dispatch(State(state), Json(json!({"action": "teleport"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!resp.success);
    assert_eq!(resp.error.as_deref(), Some("Unknown action"));
}

#[tokio::test]
async fn malformed_known_actions_report_a_validation_error() {
    let state = memory_state();
    let body = json!({
        "action": "guess", "gameId": "A", "playerId": "p", "hue": "left", "chroma": 1
    });
    let (status, Json(resp)) = dispatch(State(state), Json(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!resp.success);
    let message = resp.error.expect("error message");
    assert!(message.starts_with("Invalid request"), "got: {message}");
}

#[tokio::test]
async fn create_issues_a_player_id_when_none_is_sent() {
    let state = memory_state();
    let (status, resp) = run_action(&state, action(json!({"action": "create"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(resp.success);
    let issued = resp.player_id.expect("issued id");
    Uuid::parse_str(&issued).expect("uuid-shaped id");
    assert_eq!(resp.game.unwrap().host_id, issued);
}

#[tokio::test]
async fn create_echoes_a_caller_supplied_player_id() {
    let state = memory_state();
    let (_, resp) =
        run_action(&state, action(json!({"action": "create", "playerId": "keep-me"}))).await;
    assert_eq!(resp.player_id.as_deref(), Some("keep-me"));
    assert_eq!(resp.game.unwrap().host_id, "keep-me");
}

#[tokio::test]
async fn business_failures_are_200s_with_the_envelope() {
    let state = memory_state();
    let (status, resp) = run_action(
        &state,
        action(json!({"action": "join", "gameId": "NOPE22", "playerId": "p", "name": "Ana"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(!resp.success);
    assert_eq!(resp.error.as_deref(), Some("Game not found"));
    assert_eq!(resp.code, Some("E_GAME_NOT_FOUND"));
    assert!(resp.game.is_none());
}

#[tokio::test]
async fn last_leave_returns_a_gameless_success() {
    let state = memory_state();
    seed_lobby(&state, "TEST42", 1).await;

    let (status, resp) = run_action(
        &state,
        action(json!({"action": "leave", "gameId": "TEST42", "playerId": pid(1)})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(resp.success);
    assert!(resp.game.is_none());
}

#[tokio::test]
async fn actions_drive_the_engine_end_to_end() {
    let state = memory_state();
    seed_lobby(&state, "TEST42", 2).await;

    let (status, resp) = run_action(
        &state,
        action(json!({"action": "start", "gameId": "TEST42", "playerId": pid(1)})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp.game.unwrap().round_number, 1);

    run_action(
        &state,
        action(json!({"action": "advance", "gameId": "TEST42", "playerId": pid(1)})),
    )
    .await;

    let (_, resp) = run_action(
        &state,
        action(json!({
            "action": "guess", "gameId": "TEST42", "playerId": pid(2),
            "hue": 1, "chroma": 1, "lockIn": true
        })),
    )
    .await;
    assert!(resp.success);
    // Sole guesser locked in, so the dispatch response already shows clue-2.
    assert_eq!(resp.game.unwrap().phase, crate::game::Phase::Clue2);
}

// =============================================================================
// GET POLL
// =============================================================================

#[tokio::test]
async fn poll_requires_a_game_id() {
    let state = memory_state();
    let params = PollParams { game_id: None, player_id: None };
    let (status, Json(resp)) = poll(State(state), Query(params)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error.as_deref(), Some("Game ID required"));
}

#[tokio::test]
async fn poll_maps_absence_to_404() {
    let state = memory_state();
    let params = PollParams { game_id: Some("NOPE22".into()), player_id: None };
    let (status, Json(resp)) = poll(State(state), Query(params)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!resp.success);
}

#[tokio::test]
async fn poll_returns_the_snapshot() {
    let state = memory_state();
    seed_lobby(&state, "TEST42", 2).await;

    let params = PollParams { game_id: Some("TEST42".into()), player_id: Some(pid(2)) };
    let (status, Json(resp)) = poll(State(state), Query(params)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(resp.success);
    assert_eq!(resp.game.unwrap().players.len(), 2);
}
