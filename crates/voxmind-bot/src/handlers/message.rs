use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::command_matches;
use crate::bot::BotContext;
use crate::render::{GREETING, MISSING_GEMINI_KEY_VOICE, PLACEHOLDER_TEXT};
use crate::telegram::{Message, TelegramClient, Voice};
use crate::transcribe::{TranscriptionJob, spawn_transcription};

pub(super) async fn handle_message(
    context: &Arc<BotContext>,
    client: &TelegramClient,
    message: Message,
) -> Result<()> {
    let chat_id = message.chat.id;

    if let Some(text) = message.text.as_deref()
        && command_matches(text, "/start", context.bot_username())
    {
        client
            .send_message(chat_id, GREETING, None)
            .await
            .context("Failed to send greeting")?;
        return Ok(());
    }

    if let Some(voice) = message.voice {
        return handle_voice(context, client, chat_id, voice).await;
    }

    debug!(
        chat_id,
        message_id = message.message_id,
        "Ignoring message without voice or command"
    );
    Ok(())
}

async fn handle_voice(
    context: &Arc<BotContext>,
    client: &TelegramClient,
    chat_id: i64,
    voice: Voice,
) -> Result<()> {
    let Some(gemini) = context.gemini() else {
        warn!(chat_id, "GEMINI_API_KEY is not configured; rejecting voice message");
        client
            .send_message(chat_id, MISSING_GEMINI_KEY_VOICE, None)
            .await
            .context("Failed to report missing Gemini key")?;
        return Ok(());
    };

    let placeholder = client
        .send_message(chat_id, PLACEHOLDER_TEXT, None)
        .await
        .context("Failed to send placeholder message")?;

    info!(
        chat_id,
        placeholder_id = placeholder.message_id,
        duration = ?voice.duration,
        file_size = ?voice.file_size,
        "Voice received; transcription queued"
    );

    spawn_transcription(
        context,
        client.clone(),
        gemini.clone(),
        TranscriptionJob {
            chat_id,
            placeholder_id: placeholder.message_id,
            voice,
        },
    );
    Ok(())
}
