//! `GET /status` — watcher activity since startup.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::domain::StatusSnapshot;

/// Returns the current [`StatusSnapshot`].
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.status_board.snapshot().await)
}

/// Status routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/status", get(status_handler))
}
