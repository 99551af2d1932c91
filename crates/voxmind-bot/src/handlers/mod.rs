use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::bot::BotContext;
use crate::telegram::Update;

mod callback;
mod message;

/// Routes one webhook update. Button presses take priority over messages.
pub(crate) async fn handle_update(context: &Arc<BotContext>, update: Update) -> Result<()> {
    let Some(client) = context.telegram() else {
        warn!(
            update_id = update.update_id,
            "BOT_TOKEN is not configured; dropping update"
        );
        return Ok(());
    };

    if let Some(query) = update.callback_query {
        return callback::handle_callback(context, client, query).await;
    }

    if let Some(message) = update.message {
        return message::handle_message(context, client, message).await;
    }

    debug!(
        update_id = update.update_id,
        "Ignoring update without message or callback_query"
    );
    Ok(())
}

/// Matches `/command` and `/command@username`.
///
/// The addressed form only matches when it names this bot, so commands meant
/// for other bots in a group are left alone. Without a known username only
/// the bare form matches.
fn command_matches(text: &str, command: &str, bot_username: Option<&str>) -> bool {
    let Some(rest) = text.trim().strip_prefix(command) else {
        return false;
    };
    if rest.is_empty() {
        return true;
    }
    match (rest.strip_prefix('@'), bot_username) {
        (Some(addressed), Some(username)) => addressed.eq_ignore_ascii_case(username),
        _ => false,
    }
}
