//! Telegram transport: command parsing, dispatch and reply delivery.

use std::sync::Arc;

use anyhow::Result;
use teloxide::dispatching::dialogue::GetChatId;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, Update, UpdateKind};
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};

use crate::backend::BackendClient;
use crate::config::Config;
use crate::notify::AdminNotifier;
use crate::router::{self, Invoker, Reply};

/// Shared application state, read-only after startup.
pub struct AppState {
    pub config: Config,
    pub backend: BackendClient,
    pub notifier: AdminNotifier,
}

/// Commands exposed in the Telegram "/" menu.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "snake_case", description = "Available commands:")]
pub enum Command {
    #[command(description = "Welcome message and main menu")]
    Start,
    #[command(description = "Detailed help")]
    Help,
    #[command(description = "Create a new trade offer")]
    PostTrade,
    #[command(description = "Confirm ETB payment received: /confirm_payment #EZ104")]
    ConfirmPayment(String),
    #[command(description = "Release USDT to the buyer (admin only)")]
    ReleaseFunds(String),
    #[command(description = "View your active deals")]
    MyDeals,
    #[command(description = "Admin panel (admin only)")]
    Admin,
}

/// Run the bot in long-polling mode until stopped.
pub async fn run_polling(bot: Bot, state: Arc<AppState>) -> Result<()> {
    register_commands(&bot).await;

    info!("Starting Telegram bot in polling mode...");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("bot"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

/// Register commands with Telegram so they appear in the "/" menu.
/// Failure is logged, not fatal.
pub async fn register_commands(bot: &Bot) {
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands with Telegram");
    }
}

/// The dptree handler tree used by the polling dispatcher.
fn schema() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_callback))
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(Update::filter_message().endpoint(handle_text))
}

/// Route one update through the same handlers the dispatcher uses.
/// This is the entry point for webhook-delivered updates.
pub async fn dispatch_update(
    bot: Bot,
    bot_name: &str,
    update: Update,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    match update.kind {
        UpdateKind::Message(msg) => {
            let command = msg.text().and_then(|text| Command::parse(text, bot_name).ok());
            match command {
                Some(cmd) => handle_command(bot, msg, cmd, state).await,
                None => handle_text(bot, msg, state).await,
            }
        }
        UpdateKind::CallbackQuery(query) => handle_callback(bot, query, state).await,
        other => {
            debug!("Ignoring update kind: {:?}", other);
            Ok(())
        }
    }
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let invoker = Invoker {
        id: user.id.0,
        first_name: user.first_name.clone(),
        username: user.username.clone(),
    };

    info!("Command {:?} from user {}", cmd, invoker.id);

    let reply = match cmd {
        Command::Start => router::start(&state.config, &invoker.first_name),
        Command::Help => router::help(),
        Command::PostTrade => router::post_trade(&state.config),
        Command::ConfirmPayment(args) => {
            router::confirm_payment(&state.backend, &invoker, &args).await
        }
        Command::ReleaseFunds(args) => {
            router::release_funds(&state.config, &state.backend, invoker.id, &args).await
        }
        Command::MyDeals => router::my_deals(&state.config),
        Command::Admin => router::admin_panel(&state.config, invoker.id),
    };

    send_reply(&bot, msg.chat.id, &state, reply).await
}

/// Free-text messages: trade-code detection with action buttons, or the
/// generic fallback.
async fn handle_text(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let reply = router::free_text(text);
    send_reply(&bot, msg.chat.id, &state, reply).await
}

async fn handle_callback(bot: Bot, query: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    bot.answer_callback_query(query.id.clone()).await?;

    let Some(data) = query.data.as_deref() else {
        return Ok(());
    };
    let invoker = Invoker {
        id: query.from.id.0,
        first_name: query.from.first_name.clone(),
        username: query.from.username.clone(),
    };

    info!("Callback '{}' from user {}", data, invoker.id);

    let reply = match data {
        "help" => router::help(),
        "post_trade" => router::post_trade(&state.config),
        "trade_sell" => router::trade_type(&state.config, "sell"),
        "trade_buy" => router::trade_type(&state.config, "buy"),
        "admin_pending" => {
            router::pending_deals(&state.config, &state.backend, invoker.id).await
        }
        "admin_stats" => {
            router::platform_stats(&state.config, &state.backend, invoker.id).await
        }
        other => match other.strip_prefix("confirm:") {
            Some(code) => router::confirm_payment(&state.backend, &invoker, code).await,
            None => {
                debug!("Ignoring unknown callback data: {}", other);
                return Ok(());
            }
        },
    };

    // Menu-style callbacks replace the originating message; if the message
    // is inaccessible, fall back to a fresh one.
    match query.regular_message() {
        Some(msg) => {
            let mut request = bot
                .edit_message_text(msg.chat.id, msg.id, &reply.text)
                .parse_mode(ParseMode::Markdown);
            if let Some(keyboard) = reply.keyboard {
                request = request.reply_markup(keyboard);
            }
            request.await?;
            if let Some(note) = reply.admin_note {
                state.notifier.notify(note);
            }
            Ok(())
        }
        None => match query.chat_id() {
            Some(chat_id) => send_reply(&bot, chat_id, &state, reply).await,
            None => Ok(()),
        },
    }
}

/// Send a routed reply, then forward any admin side note to the notifier.
/// The note goes out only after the user-facing response is committed.
async fn send_reply(
    bot: &Bot,
    chat_id: ChatId,
    state: &AppState,
    reply: Reply,
) -> ResponseResult<()> {
    let mut request = bot
        .send_message(chat_id, &reply.text)
        .parse_mode(ParseMode::Markdown);
    if let Some(keyboard) = reply.keyboard {
        request = request.reply_markup(keyboard);
    }
    request.await?;

    if let Some(note) = reply.admin_note {
        state.notifier.notify(note);
    }

    Ok(())
}
