//! Message formatting for everything the bot sends.
//!
//! Pure functions from backend results (or static content) to Telegram
//! Markdown text. Backend payloads are never mutated here; missing optional
//! fields degrade to a literal "N/A", never to a zero business value.

use serde_json::Value;

/// How many pending deals are listed individually before summarizing.
const PENDING_DEALS_SHOWN: usize = 5;

pub fn welcome(first_name: &str, frontend_url: &str) -> String {
    format!(
        "🎉 Welcome to P2P USDT Trading Bot, {}!\n\n\
         Your secure platform for USDT trading in Ethiopia.\n\n\
         Commands:\n\
         • /help - Get detailed help\n\
         • /post_trade - Create a new trade offer\n\
         • /confirm_payment #TRADE_CODE - Confirm ETB payment received\n\
         • /my_deals - View your active deals\n\
         • /release_funds #TRADE_CODE - (Admin only) Release USDT\n\n\
         How it works:\n\
         1️⃣ Browse listings on our website\n\
         2️⃣ Create deals and get trade codes\n\
         3️⃣ Use this bot to confirm payments\n\
         4️⃣ Admin releases USDT after confirmation\n\n\
         🔗 Platform: {}\n\
         💬 Support: Contact admin\n\n\
         Happy trading! 🚀",
        first_name, frontend_url
    )
}

pub fn help_text() -> String {
    "📖 *P2P USDT Trading Bot Help*\n\n\
     *Commands:*\n\n\
     🏠 `/start` - Welcome message and main menu\n\n\
     📝 `/post_trade` - Start creating a new trade offer\n\n\
     ✅ `/confirm_payment #EZ104` - Confirm ETB payment received\n\
     ⚠️ Only sellers can confirm payments\n\n\
     💰 `/release_funds #EZ104` - Release USDT (Admin only)\n\n\
     📊 `/my_deals` - View your active deals\n\n\
     👨‍💼 `/admin` - Admin panel (Admin only)\n\n\
     *Trading Process:*\n\
     1. Create or find a trade on the website\n\
     2. Seller sends USDT to escrow wallet\n\
     3. Buyer sends ETB to seller\n\
     4. Seller confirms payment via `/confirm_payment`\n\
     5. Admin releases USDT via `/release_funds`\n\n\
     *Important Notes:*\n\
     • Trade codes look like #EZ104\n\
     • Trades expire in 90 minutes\n\
     • 1.5% commission applies to all trades\n\
     • Always verify counterparty details"
        .to_string()
}

pub fn post_trade_text() -> String {
    "📝 *Create New Trade*\n\n\
     Choose your trade type or use our website for more options:\n\n\
     • *Sell USDT* - You have USDT, want ETB\n\
     • *Buy USDT* - You have ETB, want USDT\n\n\
     For advanced options like payment methods and limits, use our website."
        .to_string()
}

/// Shown for the trade_sell / trade_buy menu buttons.
pub fn trade_type_text(side: &str, frontend_url: &str) -> String {
    format!(
        "🌐 *Create {} Trade*\n\n\
         Please visit our website to create a detailed {} offer:\n\
         {}/post-ad\n\n\
         You can specify amount, rate, payment methods, and more!",
        capitalize(side),
        side,
        frontend_url
    )
}

pub fn my_deals_text(frontend_url: &str) -> String {
    format!(
        "📊 *Your Active Deals*\n\n\
         Deal history lives on the trading platform, not in this bot.\n\n\
         To view your deals:\n\
         1. Visit our website: {}\n\
         2. Navigate to your account section\n\
         3. View your trade history and active deals\n\n\
         For help with a specific trade, contact support with your trade code.",
        frontend_url
    )
}

pub fn admin_panel_text() -> String {
    "👨‍💼 *Admin Panel*\n\n\
     Welcome, Administrator!\n\n\
     *Quick Actions:*\n\
     • View pending deals awaiting fund release\n\
     • Check platform statistics\n\
     • Access web admin panel\n\n\
     *Commands:*\n\
     • `/release_funds #TRADE_CODE` - Release USDT\n\
     • `/admin` - Show this panel"
        .to_string()
}

pub fn denied() -> &'static str {
    "❌ This command is only available to administrators."
}

pub fn usage(command: &str) -> String {
    format!(
        "❌ Please provide a trade code.\n\nUsage: `/{} #EZ104`",
        command
    )
}

pub fn payment_confirmed(trade_code: &str) -> String {
    format!(
        "✅ *Payment Confirmed!*\n\n\
         Trade: `{}`\n\
         Status: Waiting for admin to release USDT\n\n\
         The admin has been notified and will release the USDT shortly.",
        trade_code
    )
}

pub fn backend_rejected(message: Option<&str>) -> String {
    format!("❌ Error: {}", message.unwrap_or("Unknown error"))
}

pub fn confirm_request_failed() -> &'static str {
    "❌ Failed to confirm payment. Please try again or contact admin."
}

pub fn release_request_failed() -> &'static str {
    "❌ Failed to release funds. Please check the trade code and try again."
}

pub fn network_error() -> &'static str {
    "❌ Network error. Please try again later."
}

pub fn funds_released(trade_code: &str, data: Option<&Value>) -> String {
    format!(
        "✅ *Funds Released Successfully!*\n\n\
         Trade: `{}`\n\
         USDT Amount: `{}`\n\
         Commission: `{}`\n\n\
         The buyer has received their USDT.",
        trade_code,
        field(data, "usdt_amount"),
        field(data, "commission")
    )
}

pub fn pending_deals(deals: &[Value]) -> String {
    if deals.is_empty() {
        return "✅ No pending deals requiring fund release.".to_string();
    }

    let mut text = format!("📊 *Pending Fund Releases* ({} deals)\n\n", deals.len());
    for deal in deals.iter().take(PENDING_DEALS_SHOWN) {
        text.push_str(&format!(
            "• `{}` - {} USDT\n",
            field(Some(deal), "trade_code"),
            field(Some(deal), "usdt_amount")
        ));
    }
    if deals.len() > PENDING_DEALS_SHOWN {
        text.push_str(&format!(
            "\n... and {} more deals\n",
            deals.len() - PENDING_DEALS_SHOWN
        ));
    }
    text.push_str("\nUse `/release_funds #TRADE_CODE` to release funds.");
    text
}

pub fn pending_deals_failed() -> &'static str {
    "❌ Failed to fetch pending deals."
}

pub fn platform_stats(total_listings: u64) -> String {
    format!(
        "📈 *Platform Statistics*\n\n\
         📋 Total Active Listings: {}\n\
         💰 Commission Rate: 1.5%\n\
         ⏱️ Trade Timeout: 90 minutes\n\n\
         For detailed analytics, visit the web admin panel.",
        total_listings
    )
}

pub fn platform_stats_failed() -> &'static str {
    "❌ Failed to fetch platform statistics."
}

pub fn trade_code_detected(trade_code: &str) -> String {
    format!(
        "I detected trade code `{}`.\n\nWhat would you like to do?",
        trade_code
    )
}

pub fn fallback() -> &'static str {
    "I didn't understand that command. Use /help to see available commands."
}

/// Side notification sent to the admin after a confirmed payment.
pub fn admin_payment_confirmed(
    trade_code: &str,
    first_name: &str,
    username: Option<&str>,
) -> String {
    let who = match username {
        Some(name) => format!("{} (@{})", first_name, name),
        None => first_name.to_string(),
    };
    format!(
        "💰 *Payment Confirmed*\n\n\
         Trade: `{}`\n\
         User: {}\n\
         Action: Use `/release_funds {}` to release USDT",
        trade_code, who, trade_code
    )
}

pub fn startup_notice() -> &'static str {
    "🤖 P2P USDT Trading Bot is up and running. Try /start!"
}

/// Look up a key in an optional payload, rendering missing values as "N/A".
/// Strings render without JSON quoting.
fn field(data: Option<&Value>, key: &str) -> String {
    match data.and_then(|d| d.get(key)) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "N/A".to_string(),
        Some(other) => other.to_string(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_funds_released_shows_amount_and_commission() {
        let data = json!({"usdt_amount": "100", "commission": "1.5"});
        let text = funds_released("#EZ104", Some(&data));
        assert!(text.contains("EZ104"));
        assert!(text.contains("100"));
        assert!(text.contains("1.5"));
    }

    #[test]
    fn test_funds_released_missing_fields_render_na() {
        let text = funds_released("#EZ104", None);
        assert!(text.contains("USDT Amount: `N/A`"));
        assert!(text.contains("Commission: `N/A`"));
        assert!(!text.contains("`0`"));
    }

    #[test]
    fn test_funds_released_numeric_amounts_render_bare() {
        let data = json!({"usdt_amount": 250, "commission": 3.75});
        let text = funds_released("#AB1", Some(&data));
        assert!(text.contains("`250`"));
        assert!(text.contains("`3.75`"));
    }

    #[test]
    fn test_backend_rejected_carries_message() {
        let text = backend_rejected(Some("already released"));
        assert!(text.contains("already released"));
        assert!(!text.contains("Funds Released"));
    }

    #[test]
    fn test_backend_rejected_without_message() {
        assert_eq!(backend_rejected(None), "❌ Error: Unknown error");
    }

    #[test]
    fn test_pending_deals_caps_at_five_with_summary() {
        let deals: Vec<Value> = (1..=7)
            .map(|i| json!({"trade_code": format!("#T{}", i), "usdt_amount": i * 10}))
            .collect();
        let text = pending_deals(&deals);

        for i in 1..=5 {
            assert!(text.contains(&format!("#T{}", i)));
        }
        assert!(!text.contains("#T6"));
        assert!(!text.contains("#T7"));
        assert!(text.contains("... and 2 more deals"));
        assert!(text.contains("(7 deals)"));
    }

    #[test]
    fn test_pending_deals_empty() {
        assert!(pending_deals(&[]).contains("No pending deals"));
    }

    #[test]
    fn test_pending_deals_missing_amount_renders_na() {
        let deals = vec![json!({"trade_code": "#T1"})];
        let text = pending_deals(&deals);
        assert!(text.contains("#T1"));
        assert!(text.contains("N/A USDT"));
    }

    #[test]
    fn test_admin_note_without_username() {
        let text = admin_payment_confirmed("#EZ104", "Abel", None);
        assert!(text.contains("Abel"));
        assert!(!text.contains("(@"));
    }

    #[test]
    fn test_usage_names_the_command() {
        assert!(usage("confirm_payment").contains("/confirm_payment #EZ104"));
        assert!(usage("release_funds").contains("/release_funds #EZ104"));
    }

    #[test]
    fn test_trade_type_text_capitalizes_side() {
        let text = trade_type_text("sell", "http://localhost:3000");
        assert!(text.contains("Create Sell Trade"));
        assert!(text.contains("http://localhost:3000/post-ad"));
    }
}
