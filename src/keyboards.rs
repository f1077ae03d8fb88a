//! Inline keyboard builders for the bot's menus.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Create a callback button.
fn btn(text: &str, callback_data: &str) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.to_string(), callback_data.to_string())
}

/// Create a URL button (falls back to an inert callback button if the URL
/// does not parse).
fn url_btn(text: &str, url: &str) -> InlineKeyboardButton {
    match url.parse() {
        Ok(parsed) => InlineKeyboardButton::url(text.to_string(), parsed),
        Err(_) => btn(text, "noop"),
    }
}

/// Welcome menu shown with /start.
pub fn welcome_menu(frontend_url: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![url_btn(
            "📋 View Listings",
            &format!("{}/listings", frontend_url),
        )],
        vec![btn("➕ Post Trade", "post_trade")],
        vec![btn("❓ Help", "help")],
    ])
}

/// Trade-type chooser shown with /post_trade.
pub fn post_trade_menu(frontend_url: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![btn("💰 Sell USDT", "trade_sell")],
        vec![btn("🛒 Buy USDT", "trade_buy")],
        vec![url_btn(
            "🌐 Use Website",
            &format!("{}/post-ad", frontend_url),
        )],
    ])
}

/// Pointer to the web platform shown with /my_deals.
pub fn my_deals_menu(frontend_url: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![url_btn("🌐 Visit Website", frontend_url)]])
}

/// Admin quick actions shown with /admin.
pub fn admin_menu(frontend_url: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![btn("📊 Pending Deals", "admin_pending")],
        vec![btn("📈 Platform Stats", "admin_stats")],
        vec![url_btn("🌐 Admin Panel", &format!("{}/admin", frontend_url))],
    ])
}

/// Follow-up actions offered when free text contains a trade code.
pub fn trade_code_actions(trade_code: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![btn(
        "✅ Confirm Payment",
        &format!("confirm:{}", trade_code),
    )]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_code_actions_carries_code() {
        let markup = trade_code_actions("#EZ104");
        let row = &markup.inline_keyboard[0];
        assert_eq!(row.len(), 1);
        assert_eq!(row[0].text, "✅ Confirm Payment");
    }

    #[test]
    fn test_admin_menu_has_three_rows() {
        let markup = admin_menu("http://localhost:3000");
        assert_eq!(markup.inline_keyboard.len(), 3);
    }

    #[test]
    fn test_invalid_frontend_url_degrades_to_callback() {
        // Should not panic even if the configured URL is junk.
        let markup = welcome_menu("not a url");
        assert_eq!(markup.inline_keyboard.len(), 3);
    }
}
