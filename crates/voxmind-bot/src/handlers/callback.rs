use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::bot::{BotContext, TranscriptStore};
use crate::correct::{CorrectionJob, spawn_correction};
use crate::render::{
    CALLBACK_ACK_TEXT, CORRECT_ACTION, MISSING_GEMINI_KEY_CORRECT, TEXT_NOT_FOUND,
    extract_original_text,
};
use crate::telegram::{CallbackQuery, TelegramClient};

pub(super) async fn handle_callback(
    context: &Arc<BotContext>,
    client: &TelegramClient,
    query: CallbackQuery,
) -> Result<()> {
    // Always acknowledge so the button's spinner clears, whatever comes next.
    if let Err(err) = client
        .answer_callback_query(&query.id, Some(CALLBACK_ACK_TEXT))
        .await
    {
        warn!(callback_query_id = %query.id, error = %err, "Failed to answer callback query");
    }

    if query.data.as_deref() != Some(CORRECT_ACTION) {
        debug!(data = ?query.data, "Ignoring unknown callback action");
        return Ok(());
    }

    let Some(message) = query.message else {
        debug!(callback_query_id = %query.id, "Callback without message; nothing to correct");
        return Ok(());
    };
    let chat_id = message.chat.id;
    let message_id = message.message_id;

    let original_text = resolve_original_text(
        context.transcripts(),
        chat_id,
        message_id,
        message.text.as_deref(),
    );

    let Some(gemini) = context.gemini() else {
        warn!(chat_id, "GEMINI_API_KEY is not configured; rejecting correction");
        client
            .send_message(chat_id, MISSING_GEMINI_KEY_CORRECT, None)
            .await
            .context("Failed to report missing Gemini key")?;
        return Ok(());
    };

    info!(chat_id, message_id, "Correction queued");
    spawn_correction(
        context.tasks(),
        client.clone(),
        gemini.clone(),
        CorrectionJob {
            chat_id,
            message_id,
            original_text,
        },
    );
    Ok(())
}

/// Transcript for the pressed message: store first, then the rendered text.
fn resolve_original_text(
    store: &TranscriptStore,
    chat_id: i64,
    message_id: i64,
    message_text: Option<&str>,
) -> String {
    store
        .get((chat_id, message_id))
        .or_else(|| extract_original_text(message_text).map(str::to_string))
        .unwrap_or_else(|| TEXT_NOT_FOUND.to_string())
}
