//! HTTP endpoint handlers.

pub mod status;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(system::routes())
        .merge(status::routes())
}
