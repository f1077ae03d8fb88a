mod backend;
mod bot;
mod config;
mod keyboards;
mod notify;
mod render;
mod router;
mod server;
mod trade_code;

use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::backend::BackendClient;
use crate::bot::AppState;
use crate::config::{Config, Transport};
use crate::notify::AdminNotifier;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,p2pbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    info!("Configuration loaded");
    info!("  Backend: {}", config.backend_url);
    info!("  Frontend: {}", config.frontend_url);
    info!("  Admin: {}", config.admin_id);
    info!("  Transport: {:?}", config.transport);

    let bot = Bot::new(&config.bot_token);
    let backend = BackendClient::new(&config.backend_url)?;
    let notifier = AdminNotifier::spawn(bot.clone(), ChatId(config.admin_id as i64));

    let state = Arc::new(AppState {
        config,
        backend,
        notifier,
    });

    // Best-effort startup notice so the admin knows the bot is live.
    state.notifier.notify(render::startup_notice());

    info!("Bot is starting...");

    match state.config.transport {
        Transport::Polling => {
            // Health endpoints run alongside the polling loop.
            let health_bot = bot.clone();
            let health_state = state.clone();
            tokio::spawn(async move {
                if let Err(e) = server::run(health_bot, health_state, String::new(), false).await {
                    error!("Health server error: {:#}", e);
                }
            });

            bot::run_polling(bot, state).await
        }
        Transport::Webhook => {
            bot::register_commands(&bot).await;

            let me = bot.get_me().await.context("Failed to fetch bot identity")?;
            let bot_name = me.username().to_string();

            server::run(bot, state, bot_name, true).await
        }
    }
}
