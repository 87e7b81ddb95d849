//! Game endpoint — JSON action dispatch over the session engine.
//!
//! DESIGN
//! ======
//! `POST /api/game` carries `{action, gameId?, playerId?, ...}` and maps
//! one-to-one onto engine operations; `GET /api/game` is the poll
//! accessor (timer check included). Every response uses the same
//! envelope: `{success, error?, code?, game?, playerId?}`. Business
//! failures are 200s with `success:false`; clients branch on the
//! envelope, not the status line. Unknown actions get a 400, internal
//! faults a 500 with a generic message.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::game::{Game, SettingsPatch};
use crate::services::engine::{self, GameError};
use crate::state::AppState;

// =============================================================================
// WIRE TYPES
// =============================================================================

/// One caller action. The `action` tag selects the engine operation.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum GameAction {
    #[serde(rename_all = "camelCase")]
    Create {
        #[serde(default)]
        player_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Join { game_id: String, player_id: String, name: String },
    #[serde(rename_all = "camelCase")]
    Leave { game_id: String, player_id: String },
    #[serde(rename_all = "camelCase")]
    Start { game_id: String, player_id: String },
    #[serde(rename_all = "camelCase")]
    Advance { game_id: String, player_id: String },
    #[serde(rename_all = "camelCase")]
    Guess {
        game_id: String,
        player_id: String,
        hue: i64,
        chroma: i64,
        #[serde(default)]
        lock_in: bool,
    },
    #[serde(rename_all = "camelCase")]
    SubmitClue { game_id: String, player_id: String, clue: String },
    #[serde(rename_all = "camelCase")]
    UpdateSettings {
        game_id: String,
        player_id: String,
        settings: SettingsPatch,
    },
    #[serde(rename_all = "camelCase")]
    End { game_id: String, player_id: String },
    #[serde(rename_all = "camelCase")]
    PlayAgain { game_id: String, player_id: String },
    #[serde(rename_all = "camelCase")]
    Poll {
        game_id: String,
        #[serde(default)]
        player_id: Option<String>,
    },
}

/// Uniform response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<Game>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
}

impl GameResponse {
    fn ok(game: Game) -> Self {
        Self { success: true, error: None, code: None, game: Some(game), player_id: None }
    }

    fn ok_with_player(game: Game, player_id: String) -> Self {
        Self { success: true, error: None, code: None, game: Some(game), player_id: Some(player_id) }
    }

    /// Success with no surviving game (last player left the lobby).
    fn gone() -> Self {
        Self { success: true, error: None, code: None, game: None, player_id: None }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self { success: false, error: Some(message.into()), code: None, game: None, player_id: None }
    }
}

/// Map an engine error onto the envelope and status. Internal faults are
/// logged in full here and reported generically.
fn error_response(err: &GameError) -> (StatusCode, GameResponse) {
    if err.is_internal() {
        error!(error = %err, code = err.code(), "engine operation failed");
        let mut resp = GameResponse::failure("Internal server error");
        resp.code = Some(err.code());
        return (StatusCode::INTERNAL_SERVER_ERROR, resp);
    }
    let mut resp = GameResponse::failure(err.to_string());
    resp.code = Some(err.code());
    (StatusCode::OK, resp)
}

fn result_response(result: Result<Game, GameError>) -> (StatusCode, GameResponse) {
    match result {
        Ok(game) => (StatusCode::OK, GameResponse::ok(game)),
        Err(err) => error_response(&err),
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Action tags `dispatch` accepts. Used to tell an unrecognized action
/// apart from a malformed payload for a known one.
const ACTION_TAGS: [&str; 11] = [
    "create", "join", "leave", "start", "advance", "guess", "submitClue", "updateSettings", "end",
    "playAgain", "poll",
];

/// `POST /api/game`: dispatch one action.
pub async fn dispatch(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<GameResponse>) {
    let tag_known = body
        .get("action")
        .and_then(serde_json::Value::as_str)
        .is_some_and(|tag| ACTION_TAGS.contains(&tag));
    let action: GameAction = match serde_json::from_value(body) {
        Ok(action) => action,
        Err(err) if tag_known => {
            let resp = GameResponse::failure(format!("Invalid request: {err}"));
            return (StatusCode::BAD_REQUEST, Json(resp));
        }
        Err(_) => return (StatusCode::BAD_REQUEST, Json(GameResponse::failure("Unknown action"))),
    };
    let (status, response) = run_action(&state, action).await;
    (status, Json(response))
}

pub(crate) async fn run_action(state: &AppState, action: GameAction) -> (StatusCode, GameResponse) {
    match action {
        GameAction::Create { player_id } => {
            // Issue an id for first-time callers; returning it lets the
            // client persist its identity locally.
            let player_id = player_id.unwrap_or_else(|| Uuid::new_v4().to_string());
            match engine::create_game(state, &player_id).await {
                Ok(game) => (StatusCode::OK, GameResponse::ok_with_player(game, player_id)),
                Err(err) => error_response(&err),
            }
        }
        GameAction::Join { game_id, player_id, name } => {
            result_response(engine::join_game(state, &game_id, &player_id, &name).await)
        }
        GameAction::Leave { game_id, player_id } => {
            match engine::leave_game(state, &game_id, &player_id).await {
                Ok(Some(game)) => (StatusCode::OK, GameResponse::ok(game)),
                Ok(None) => (StatusCode::OK, GameResponse::gone()),
                Err(err) => error_response(&err),
            }
        }
        GameAction::Start { game_id, player_id } => {
            result_response(engine::start_game(state, &game_id, &player_id).await)
        }
        GameAction::Advance { game_id, player_id } => {
            result_response(engine::advance_phase(state, &game_id, &player_id).await)
        }
        GameAction::Guess { game_id, player_id, hue, chroma, lock_in } => {
            result_response(engine::submit_guess(state, &game_id, &player_id, hue, chroma, lock_in).await)
        }
        GameAction::SubmitClue { game_id, player_id, clue } => {
            result_response(engine::submit_clue(state, &game_id, &player_id, &clue).await)
        }
        GameAction::UpdateSettings { game_id, player_id, settings } => {
            result_response(engine::update_settings(state, &game_id, &player_id, settings).await)
        }
        GameAction::End { game_id, player_id } => {
            result_response(engine::end_game(state, &game_id, &player_id).await)
        }
        GameAction::PlayAgain { game_id, player_id } => {
            result_response(engine::play_again(state, &game_id, &player_id).await)
        }
        GameAction::Poll { game_id, player_id } => {
            result_response(engine::poll_game(state, &game_id, player_id.as_deref()).await)
        }
    }
}

/// Query parameters for the GET poll accessor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollParams {
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub player_id: Option<String>,
}

/// `GET /api/game?gameId=...&playerId=...`: poll accessor. Runs the
/// timer check before returning the snapshot.
pub async fn poll(
    State(state): State<AppState>,
    Query(params): Query<PollParams>,
) -> (StatusCode, Json<GameResponse>) {
    let Some(game_id) = params.game_id else {
        return (StatusCode::BAD_REQUEST, Json(GameResponse::failure("Game ID required")));
    };
    match engine::poll_game(&state, &game_id, params.player_id.as_deref()).await {
        Ok(game) => (StatusCode::OK, Json(GameResponse::ok(game))),
        Err(GameError::NotFound) => {
            (StatusCode::NOT_FOUND, Json(GameResponse::failure(GameError::NotFound.to_string())))
        }
        Err(err) => {
            let (status, resp) = error_response(&err);
            (status, Json(resp))
        }
    }
}

#[cfg(test)]
#[path = "game_test.rs"]
mod tests;
