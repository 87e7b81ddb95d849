//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The engine is transport-agnostic; this router is the one thin
//! boundary over it: a single action-dispatch endpoint plus a poll
//! accessor, mirroring how clients actually drive a game (poll loop +
//! fire-and-forget actions).

pub mod game;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

#[must_use]
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/game", get(game::poll).post(game::dispatch))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
