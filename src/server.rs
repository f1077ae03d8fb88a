//! HTTP surface: health checks and the optional webhook transport.
//!
//! The health endpoints share no mutable state with update handling; the
//! webhook endpoint feeds updates into the same handlers the polling
//! dispatcher uses.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use teloxide::prelude::*;
use teloxide::types::Update;
use tracing::{error, info};
use url::Url;

use crate::bot::{self, AppState};

#[derive(Clone)]
struct ServerState {
    bot: Bot,
    app: Arc<AppState>,
    /// Bot username, needed to parse `/cmd@botname` mentions from webhook
    /// updates. Empty in health-only mode.
    bot_name: String,
}

/// Serve the HTTP endpoints on the configured port until stopped.
///
/// With `webhook_enabled` the router also accepts Telegram updates on
/// `POST /webhook` and registers webhook URLs via `POST /set_webhook`.
pub async fn run(
    bot: Bot,
    app: Arc<AppState>,
    bot_name: String,
    webhook_enabled: bool,
) -> Result<()> {
    let port = app.config.health_port;
    let state = ServerState { bot, app, bot_name };

    let mut router = Router::new()
        .route("/", get(service_status))
        .route("/health", get(health));

    if webhook_enabled {
        router = router
            .route("/webhook", post(receive_update))
            .route("/set_webhook", post(set_webhook));
    }

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("HTTP server listening on {} (webhook: {})", addr, webhook_enabled);

    axum::serve(listener, router.with_state(state))
        .await
        .context("Server error")?;

    Ok(())
}

async fn service_status(State(state): State<ServerState>) -> Json<Value> {
    let config = &state.app.config;
    Json(json!({
        "status": "healthy",
        "service": "P2P USDT Trading Bot",
        "bot_token": config.masked_token(),
        "admin_id": config.admin_id,
        "frontend_url": config.frontend_url,
        "backend_url": config.backend_url,
    }))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "P2P USDT Trading Bot"}))
}

async fn receive_update(
    State(state): State<ServerState>,
    Json(update): Json<Update>,
) -> Result<Json<Value>, StatusCode> {
    match bot::dispatch_update(
        state.bot.clone(),
        &state.bot_name,
        update,
        state.app.clone(),
    )
    .await
    {
        Ok(()) => Ok(Json(json!({"status": "ok"}))),
        Err(e) => {
            error!(error = %e, "Webhook update failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(Debug, Deserialize)]
struct SetWebhookRequest {
    webhook_url: String,
}

async fn set_webhook(
    State(state): State<ServerState>,
    Json(body): Json<SetWebhookRequest>,
) -> Result<Json<Value>, StatusCode> {
    let url: Url = body
        .webhook_url
        .parse()
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    state.bot.set_webhook(url).await.map_err(|e| {
        error!(error = %e, "Failed to register webhook");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    info!("Webhook registered: {}", body.webhook_url);
    Ok(Json(json!({"status": "ok", "webhook_url": body.webhook_url})))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_body() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "healthy");
    }

    #[test]
    fn test_set_webhook_request_parses() {
        let body: SetWebhookRequest =
            serde_json::from_str(r#"{"webhook_url": "https://example.com/webhook"}"#).unwrap();
        assert_eq!(body.webhook_url, "https://example.com/webhook");
    }
}
