//! Shared application state injected into all Axum handlers.

use crate::domain::StatusBoard;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Folded watcher status.
    pub status_board: StatusBoard,
}

impl AppState {
    /// Creates the state around a status board.
    #[must_use]
    pub const fn new(status_board: StatusBoard) -> Self {
        Self { status_board }
    }
}
