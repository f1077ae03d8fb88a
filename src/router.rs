//! Command routing: maps chat commands and callback actions to backend
//! calls and rendered replies.
//!
//! Authorization and argument validation happen here, before any network
//! I/O. Backend and network failures are converted to user-facing messages
//! and never propagate out of a single update's handling.

use teloxide::types::InlineKeyboardMarkup;
use tracing::{error, warn};

use crate::backend::{BackendClient, BackendError};
use crate::config::Config;
use crate::keyboards;
use crate::render;
use crate::trade_code;

/// The user behind an incoming command or callback.
#[derive(Debug, Clone)]
pub struct Invoker {
    pub id: u64,
    pub first_name: String,
    pub username: Option<String>,
}

/// What a routed command sends back to the chat.
pub struct Reply {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
    /// Side notification for the admin, delivered after the reply is sent.
    pub admin_note: Option<String>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
            admin_note: None,
        }
    }

    fn with_keyboard(text: impl Into<String>, keyboard: InlineKeyboardMarkup) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
            admin_note: None,
        }
    }

    fn and_notify(mut self, note: String) -> Self {
        self.admin_note = Some(note);
        self
    }
}

pub fn start(config: &Config, first_name: &str) -> Reply {
    Reply::with_keyboard(
        render::welcome(first_name, &config.frontend_url),
        keyboards::welcome_menu(&config.frontend_url),
    )
}

pub fn help() -> Reply {
    Reply::text(render::help_text())
}

pub fn post_trade(config: &Config) -> Reply {
    Reply::with_keyboard(
        render::post_trade_text(),
        keyboards::post_trade_menu(&config.frontend_url),
    )
}

/// Backend integration for per-user deal history is deferred; point at the
/// web platform instead.
pub fn my_deals(config: &Config) -> Reply {
    Reply::with_keyboard(
        render::my_deals_text(&config.frontend_url),
        keyboards::my_deals_menu(&config.frontend_url),
    )
}

pub fn trade_type(config: &Config, side: &str) -> Reply {
    Reply::text(render::trade_type_text(side, &config.frontend_url))
}

pub async fn confirm_payment(backend: &BackendClient, invoker: &Invoker, args: &str) -> Reply {
    let Some(raw_code) = args.split_whitespace().next() else {
        return Reply::text(render::usage("confirm_payment"));
    };
    let code = trade_code::normalize(raw_code);

    match backend.confirm_payment(&code, invoker.id).await {
        Ok(response) if response.success => {
            let note = render::admin_payment_confirmed(
                &code,
                &invoker.first_name,
                invoker.username.as_deref(),
            );
            Reply::text(render::payment_confirmed(&code)).and_notify(note)
        }
        Ok(response) => Reply::text(render::backend_rejected(response.message.as_deref())),
        Err(BackendError::Status(status)) => {
            warn!(%status, trade_code = %code, "Payment confirmation rejected by backend");
            Reply::text(render::confirm_request_failed())
        }
        Err(BackendError::Network(e)) => {
            error!(error = %e, trade_code = %code, "Error confirming payment");
            Reply::text(render::network_error())
        }
    }
}

pub async fn release_funds(
    config: &Config,
    backend: &BackendClient,
    invoker_id: u64,
    args: &str,
) -> Reply {
    if invoker_id != config.admin_id {
        return Reply::text(render::denied());
    }

    let Some(raw_code) = args.split_whitespace().next() else {
        return Reply::text(render::usage("release_funds"));
    };
    let code = trade_code::normalize(raw_code);

    match backend
        .release_funds(&code, config.admin_id, &config.release_secret)
        .await
    {
        Ok(response) if response.success => {
            Reply::text(render::funds_released(&code, response.data.as_ref()))
        }
        Ok(response) => Reply::text(render::backend_rejected(response.message.as_deref())),
        Err(BackendError::Status(status)) => {
            warn!(%status, trade_code = %code, "Fund release rejected by backend");
            Reply::text(render::release_request_failed())
        }
        Err(BackendError::Network(e)) => {
            error!(error = %e, trade_code = %code, "Error releasing funds");
            Reply::text(render::network_error())
        }
    }
}

pub fn admin_panel(config: &Config, invoker_id: u64) -> Reply {
    if invoker_id != config.admin_id {
        return Reply::text(render::denied());
    }
    Reply::with_keyboard(
        render::admin_panel_text(),
        keyboards::admin_menu(&config.frontend_url),
    )
}

pub async fn pending_deals(config: &Config, backend: &BackendClient, invoker_id: u64) -> Reply {
    if invoker_id != config.admin_id {
        return Reply::text(render::denied());
    }

    match backend.pending_deals().await {
        Ok(deals) => Reply::text(render::pending_deals(&deals)),
        Err(BackendError::Status(status)) => {
            warn!(%status, "Pending deals fetch rejected by backend");
            Reply::text(render::pending_deals_failed())
        }
        Err(BackendError::Network(e)) => {
            error!(error = %e, "Error fetching pending deals");
            Reply::text(render::network_error())
        }
    }
}

pub async fn platform_stats(config: &Config, backend: &BackendClient, invoker_id: u64) -> Reply {
    if invoker_id != config.admin_id {
        return Reply::text(render::denied());
    }

    match backend.total_listings().await {
        Ok(total) => Reply::text(render::platform_stats(total)),
        Err(BackendError::Status(status)) => {
            warn!(%status, "Listings fetch rejected by backend");
            Reply::text(render::platform_stats_failed())
        }
        Err(BackendError::Network(e)) => {
            error!(error = %e, "Error fetching platform statistics");
            Reply::text(render::network_error())
        }
    }
}

/// Non-command text: offer actions if it mentions a trade code, otherwise a
/// generic pointer at /help.
pub fn free_text(text: &str) -> Reply {
    match trade_code::extract(text) {
        Some(raw) => {
            let code = trade_code::normalize(raw);
            Reply::with_keyboard(
                render::trade_code_detected(&code),
                keyboards::trade_code_actions(&code),
            )
        }
        None => Reply::text(render::fallback()),
    }
}
