//! Read-only HTTP surface: health and watcher status.

pub mod handlers;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete router.
pub fn build_router() -> Router<AppState> {
    handlers::routes()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::{RunId, StatusBoard, WatchEvent};

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let Ok(request) = Request::builder().uri(uri).body(Body::empty()) else {
            panic!("bad request");
        };
        let Ok(resp) = app.oneshot(request).await else {
            panic!("router failed");
        };
        let status = resp.status();
        let Ok(bytes) = to_bytes(resp.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        let json = serde_json::from_slice(&bytes).unwrap_or_default();
        (status, json)
    }

    #[tokio::test]
    async fn health_reports_version() {
        let app = build_router().with_state(AppState::new(StatusBoard::new()));
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn status_reflects_recorded_events() {
        let board = StatusBoard::new();
        board
            .record(&WatchEvent::AlertSent {
                run_id: RunId::new(),
                patient_id: "4".to_string(),
                risk_score: 95.5,
                timestamp: Utc::now(),
            })
            .await;

        let app = build_router().with_state(AppState::new(board));
        let (status, body) = get_json(app, "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["alerts_sent"], 1);
        assert_eq!(body["replications_succeeded"], 0);
        assert!(body["last_replication"].is_null());
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = build_router().with_state(AppState::new(StatusBoard::new()));
        let Ok(request) = Request::builder().uri("/nope").body(Body::empty()) else {
            panic!("bad request");
        };
        let Ok(resp) = app.oneshot(request).await else {
            panic!("router failed");
        };
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
