//! Best-effort one-way notifications to the administrator chat.
//!
//! Delivery runs on a background worker fed by a channel, so a failed or
//! slow send can never fail the user command that triggered it.

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AdminNotifier {
    sender: mpsc::UnboundedSender<String>,
}

impl AdminNotifier {
    /// Spawn the delivery worker and return a handle for enqueueing messages.
    pub fn spawn(bot: Bot, admin_chat: ChatId) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(worker(bot, admin_chat, receiver));
        Self { sender }
    }

    /// Queue a message for the admin. Never blocks and never fails the caller.
    pub fn notify(&self, text: impl Into<String>) {
        if self.sender.send(text.into()).is_err() {
            warn!("Admin notifier channel closed");
        }
    }
}

async fn worker(bot: Bot, admin_chat: ChatId, mut receiver: mpsc::UnboundedReceiver<String>) {
    info!(chat_id = admin_chat.0, "Admin notifier started");

    while let Some(text) = receiver.recv().await {
        if let Err(e) = bot
            .send_message(admin_chat, &text)
            .parse_mode(ParseMode::Markdown)
            .await
        {
            error!(error = %e, "Failed to notify admin");
        }
    }

    warn!("Admin notifier worker shutting down");
}
