//! HTTP delivery of alert payloads.

use std::time::Duration;

use reqwest::StatusCode;

use super::AlertSender;
use crate::domain::AlertPayload;
use crate::error::SentinelError;

/// Posts alert payloads as JSON to the notification service.
#[derive(Debug, Clone)]
pub struct HttpAlertSender {
    client: reqwest::Client,
    url: reqwest::Url,
}

impl HttpAlertSender {
    /// Creates a sender with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::Http`] if the HTTP client cannot be built.
    pub fn new(url: reqwest::Url, timeout: Duration) -> Result<Self, SentinelError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

impl AlertSender for HttpAlertSender {
    async fn send(&self, payload: &AlertPayload) -> Result<String, SentinelError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(
                    status = status.as_u16(),
                    error = %e,
                    "could not read notification response body"
                );
                String::new()
            }
        };
        if status == StatusCode::OK {
            Ok(body)
        } else {
            Err(SentinelError::NotificationRejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::post;
    use axum::{Json, Router};

    use super::*;

    type Received = Arc<Mutex<Vec<serde_json::Value>>>;

    async fn receive(
        State(received): State<Received>,
        Json(body): Json<serde_json::Value>,
    ) -> (AxumStatus, Json<serde_json::Value>) {
        let missing = ["patientId", "patientName", "sepsisRisk", "doctorEmail"]
            .iter()
            .any(|k| body.get(k).is_none());
        if let Ok(mut r) = received.lock() {
            r.push(body);
        }
        if missing {
            (
                AxumStatus::BAD_REQUEST,
                Json(serde_json::json!({"message": "Missing required fields."})),
            )
        } else {
            (
                AxumStatus::OK,
                Json(serde_json::json!({"message": "Sepsis alert email sent successfully!"})),
            )
        }
    }

    async fn spawn_receiver(path: &'static str) -> (reqwest::Url, Received) {
        let received: Received = Arc::default();
        let app = Router::new()
            .route(path, post(receive))
            .with_state(Arc::clone(&received));
        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        let Ok(url) = reqwest::Url::parse(&format!("http://{addr}{path}")) else {
            panic!("bad url");
        };
        (url, received)
    }

    fn payload() -> AlertPayload {
        AlertPayload {
            patient_id: "12".to_string(),
            patient_name: "Ravi Kumar".to_string(),
            sepsis_risk: 83.0,
            doctor_email: "dr.mehta@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn posts_json_payload() {
        let (url, received) = spawn_receiver("/api/email/send-email").await;
        let Ok(sender) = HttpAlertSender::new(url, Duration::from_secs(5)) else {
            panic!("client build failed");
        };

        let result = sender.send(&payload()).await;
        let Ok(body) = result else {
            panic!("send failed: {result:?}");
        };
        assert!(body.contains("sent successfully"));

        let bodies = received.lock().map(|r| r.clone()).unwrap_or_default();
        let [only] = bodies.as_slice() else {
            panic!("expected one request");
        };
        assert_eq!(only["patientId"], "12");
        assert_eq!(only["doctorEmail"], "dr.mehta@example.com");
        assert_eq!(only["sepsisRisk"], 83.0);
    }

    #[tokio::test]
    async fn non_200_is_rejected() {
        let (url, _received) = spawn_receiver("/send").await;
        let Ok(wrong) = url.join("/elsewhere") else {
            panic!("bad url");
        };
        let Ok(sender) = HttpAlertSender::new(wrong, Duration::from_secs(5)) else {
            panic!("client build failed");
        };
        let result = sender.send(&payload()).await;
        assert!(matches!(
            result,
            Err(SentinelError::NotificationRejected { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn truncated_body_on_200_still_counts_as_sent() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            // Drain the request so closing the socket sends FIN, not RST.
            let mut request = Vec::new();
            let mut chunk = [0_u8; 1024];
            while !request.ends_with(b"}") {
                match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => request.extend_from_slice(chunk.get(..n).unwrap_or_default()),
                }
            }
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial")
                .await;
            let _ = socket.shutdown().await;
        });

        let Ok(url) = reqwest::Url::parse(&format!("http://{addr}/send")) else {
            panic!("bad url");
        };
        let Ok(sender) = HttpAlertSender::new(url, Duration::from_secs(5)) else {
            panic!("client build failed");
        };
        let result = sender.send(&payload()).await;
        let Ok(body) = result else {
            panic!("200 should be delivered: {result:?}");
        };
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_http_error() {
        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        drop(listener);
        let Ok(url) = reqwest::Url::parse(&format!("http://{addr}/send")) else {
            panic!("bad url");
        };
        let Ok(sender) = HttpAlertSender::new(url, Duration::from_secs(1)) else {
            panic!("client build failed");
        };
        assert!(matches!(
            sender.send(&payload()).await,
            Err(SentinelError::Http(_))
        ));
    }
}
