use anyhow::{Context, Result};

/// How the bot receives updates from Telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Long polling against the Telegram API (default).
    Polling,
    /// Updates pushed by Telegram to our /webhook endpoint.
    Webhook,
}

/// Runtime configuration, read once from the environment at startup and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    /// The single privileged Telegram user allowed to release funds.
    pub admin_id: u64,
    /// Shared credential sent with fund-release requests.
    pub release_secret: String,
    /// Base URL of the trading backend API.
    pub backend_url: String,
    /// Public web frontend, linked from keyboards.
    pub frontend_url: String,
    pub transport: Transport,
    /// Port for the health check / webhook HTTP server.
    pub health_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Missing or malformed required values are fatal; the process must not
    /// start without a token, admin identity and release secret.
    pub fn from_env() -> Result<Self> {
        let bot_token = require("TELEGRAM_BOT_TOKEN")?;
        let admin_id = require("TELEGRAM_ADMIN_ID")?
            .parse()
            .context("TELEGRAM_ADMIN_ID must be a numeric Telegram user id")?;
        let release_secret = require("RELEASE_SECRET")?;
        let backend_url = optional("BACKEND_URL", "http://localhost:8000");
        let frontend_url = optional("FRONTEND_URL", "http://localhost:3000");

        let transport = match optional("BOT_TRANSPORT", "polling").as_str() {
            "polling" => Transport::Polling,
            "webhook" => Transport::Webhook,
            other => anyhow::bail!("BOT_TRANSPORT must be 'polling' or 'webhook', got '{}'", other),
        };

        let health_port = optional("HEALTH_PORT", "8080")
            .parse()
            .context("HEALTH_PORT must be a port number")?;

        Ok(Self {
            bot_token,
            admin_id,
            release_secret,
            backend_url,
            frontend_url,
            transport,
            health_port,
        })
    }

    /// Bot token with everything past the first few characters masked, safe
    /// to expose on the health endpoint.
    pub fn masked_token(&self) -> String {
        let prefix: String = self.bot_token.chars().take(10).collect();
        format!("{}...", prefix)
    }
}

fn require(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .with_context(|| format!("Missing required environment variable: {}", name))
}

fn optional(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
