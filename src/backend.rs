use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

/// How long a backend call may take before it is treated as failed.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure talking to the trading backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure: timeout, refused connection, DNS.
    #[error("backend unreachable: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend answered with a non-success HTTP status.
    #[error("backend returned HTTP {0}")]
    Status(StatusCode),
}

/// Response envelope used by the backend's trading endpoints.
///
/// Nothing beyond `success`/`message`/`data` is guaranteed, so every field
/// is optional and callers must treat missing `data` keys as absent rather
/// than as zero business values.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// HTTP client for the trading backend.
///
/// Calls are attempted exactly once. The backend's fund-release endpoint has
/// no idempotency keys, so a blind retry could double-release escrow.
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build backend HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// `POST /confirm-payment` — the seller reports ETB received.
    pub async fn confirm_payment(
        &self,
        trade_code: &str,
        user_id: u64,
    ) -> Result<ApiResponse, BackendError> {
        self.post(
            "/confirm-payment",
            &json!({
                "trade_code": trade_code,
                "user_id": user_id,
                "notes": format!("Payment confirmed via Telegram by user {}", user_id),
            }),
        )
        .await
    }

    /// `POST /admin/release-funds` — release escrowed USDT to the buyer.
    pub async fn release_funds(
        &self,
        trade_code: &str,
        admin_id: u64,
        release_secret: &str,
    ) -> Result<ApiResponse, BackendError> {
        self.post(
            "/admin/release-funds",
            &json!({
                "trade_code": trade_code,
                "release_secret": release_secret,
                "notes": format!("Funds released via Telegram by admin {}", admin_id),
            }),
        )
        .await
    }

    /// `GET /admin/pending-deals?status=paid` — deals awaiting fund release.
    pub async fn pending_deals(&self) -> Result<Vec<Value>, BackendError> {
        let response = self.get("/admin/pending-deals?status=paid").await?;
        Ok(match response.data {
            Some(Value::Array(deals)) => deals,
            _ => Vec::new(),
        })
    }

    /// `GET /listings` — count of active listings on the platform.
    pub async fn total_listings(&self) -> Result<u64, BackendError> {
        let url = format!("{}/listings", self.base_url);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status));
        }

        let body: Value = response.json().await?;
        Ok(body.get("total").and_then(Value::as_u64).unwrap_or(0))
    }

    async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        Self::decode(response).await
    }

    async fn get(&self, path: &str) -> Result<ApiResponse, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<ApiResponse, BackendError> {
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Serve a router on an ephemeral local port and return its base URL.
    async fn spawn_backend(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// A base URL that nothing listens on (bound, then dropped).
    async fn dead_backend() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_confirm_payment_decodes_success_envelope() {
        let app = Router::new().route(
            "/confirm-payment",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["trade_code"], "#EZ104");
                assert_eq!(body["user_id"], 42);
                Json(json!({"success": true, "message": "confirmed"}))
            }),
        );
        let base = spawn_backend(app).await;
        let client = BackendClient::new(&base).unwrap();

        let response = client.confirm_payment("#EZ104", 42).await.unwrap();
        assert!(response.success);
        assert_eq!(response.message.as_deref(), Some("confirmed"));
    }

    #[tokio::test]
    async fn test_non_2xx_is_status_error_not_success() {
        let app = Router::new().route(
            "/confirm-payment",
            post(|| async { (axum::http::StatusCode::BAD_GATEWAY, "oops") }),
        );
        let base = spawn_backend(app).await;
        let client = BackendClient::new(&base).unwrap();

        match client.confirm_payment("#EZ104", 42).await {
            Err(BackendError::Status(status)) => assert_eq!(status.as_u16(), 502),
            other => panic!("expected status error, got {:?}", other.map(|r| r.success)),
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let base = dead_backend().await;
        let client = BackendClient::new(&base).unwrap();

        match client.confirm_payment("#EZ104", 42).await {
            Err(BackendError::Network(_)) => {}
            other => panic!("expected network error, got {:?}", other.map(|r| r.success)),
        }
    }

    #[tokio::test]
    async fn test_client_usable_after_network_error() {
        let dead = dead_backend().await;
        let client = BackendClient::new(&dead).unwrap();
        assert!(client.pending_deals().await.is_err());

        let app = Router::new().route(
            "/admin/pending-deals",
            get(|| async { Json(json!({"data": [{"trade_code": "#A1", "usdt_amount": "5"}]})) }),
        );
        let base = spawn_backend(app).await;
        let client = BackendClient::new(&base).unwrap();

        let deals = client.pending_deals().await.unwrap();
        assert_eq!(deals.len(), 1);
    }

    #[tokio::test]
    async fn test_pending_deals_missing_data_is_empty() {
        let app = Router::new().route(
            "/admin/pending-deals",
            get(|| async { Json(json!({"success": true})) }),
        );
        let base = spawn_backend(app).await;
        let client = BackendClient::new(&base).unwrap();

        assert!(client.pending_deals().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_total_listings_defaults_to_zero() {
        let app = Router::new().route("/listings", get(|| async { Json(json!({})) }));
        let base = spawn_backend(app).await;
        let client = BackendClient::new(&base).unwrap();

        assert_eq!(client.total_listings().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_release_funds_carries_secret_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let recorded = hits.clone();
        let app = Router::new().route(
            "/admin/release-funds",
            post(move |Json(body): Json<Value>| {
                let recorded = recorded.clone();
                async move {
                    recorded.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(body["release_secret"], "s3cret");
                    Json(json!({"success": true, "data": {"usdt_amount": "100"}}))
                }
            }),
        );
        let base = spawn_backend(app).await;
        let client = BackendClient::new(&base).unwrap();

        let response = client.release_funds("#EZ104", 99, "s3cret").await.unwrap();
        assert!(response.success);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
