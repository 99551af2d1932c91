use std::fmt;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tracing::{info, warn};
use voxmind_core::prompts::TRANSCRIBE_PROMPT;
use voxmind_core::providers::GeminiClient;

use crate::bot::BotContext;
use crate::render::{
    correct_keyboard, failure_message, file_unavailable_message, transcript_message,
};
use crate::telegram::{TelegramApiError, TelegramClient, Voice};

/// Gemini rejects requests whose inline data pushes them past 20MB.
const MAX_AUDIO_BYTES: u64 = 20 * 1024 * 1024;
const DEFAULT_VOICE_MIME: &str = "audio/ogg";

pub(crate) struct TranscriptionJob {
    pub chat_id: i64,
    pub placeholder_id: i64,
    pub voice: Voice,
}

pub(crate) fn spawn_transcription(
    context: &Arc<BotContext>,
    telegram: TelegramClient,
    gemini: GeminiClient,
    job: TranscriptionJob,
) {
    let label = format!(
        "transcribe chat={} message={}",
        job.chat_id, job.placeholder_id
    );
    let task_context = Arc::clone(context);
    context.tasks().spawn(label, async move {
        run_transcription(&task_context, &telegram, &gemini, job).await
    });
}

/// Always ends by editing the placeholder, with either the transcript or an error.
async fn run_transcription(
    context: &BotContext,
    telegram: &TelegramClient,
    gemini: &GeminiClient,
    job: TranscriptionJob,
) -> Result<()> {
    let TranscriptionJob {
        chat_id,
        placeholder_id,
        voice,
    } = job;

    let (text, keyboard) = match transcribe_voice(telegram, gemini, &voice).await {
        Ok(transcript) => {
            info!(
                chat_id,
                message_id = placeholder_id,
                chars = transcript.chars().count(),
                "Transcription finished"
            );
            let text = transcript_message(&transcript);
            context
                .transcripts()
                .insert((chat_id, placeholder_id), transcript);
            (text, Some(correct_keyboard()))
        }
        Err(failure) => {
            warn!(chat_id, message_id = placeholder_id, error = %failure, "Transcription failed");
            (failure.user_message(), None)
        }
    };

    let Err(err) = telegram
        .edit_message_text(chat_id, placeholder_id, &text, keyboard.as_ref())
        .await
    else {
        return Ok(());
    };

    // The transcript didn't go through; try once more with the error so the
    // placeholder doesn't stay at "⏳...".
    if keyboard.is_some() {
        let fallback = failure_message("خطا در ارسال متن", &format!("{err:#}"));
        if let Err(retry) = telegram
            .edit_message_text(chat_id, placeholder_id, &fallback, None)
            .await
        {
            warn!(
                chat_id,
                message_id = placeholder_id,
                error = %format!("{retry:#}"),
                "Failed to report edit failure"
            );
        }
    }
    Err(err.context("Failed to edit placeholder"))
}

enum TranscribeFailure {
    TooLarge { size: u64 },
    /// Telegram rejected `getFile` or returned no `file_path`.
    FileUnavailable(anyhow::Error),
    Failed(anyhow::Error),
}

impl TranscribeFailure {
    fn user_message(&self) -> String {
        match self {
            Self::TooLarge { size } => failure_message(
                "فایل صوتی بیش از حد بزرگ است",
                &format!(
                    "{:.1} MB (max {} MB)",
                    *size as f64 / (1024.0 * 1024.0),
                    MAX_AUDIO_BYTES / (1024 * 1024)
                ),
            ),
            Self::FileUnavailable(err) => file_unavailable_message(&format!("{err:#}")),
            Self::Failed(err) => failure_message("خطا در پردازش ویس", &format!("{err:#}")),
        }
    }
}

impl fmt::Display for TranscribeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge { size } => write!(f, "voice file too large ({size} bytes)"),
            Self::FileUnavailable(err) => write!(f, "file unavailable: {err:#}"),
            Self::Failed(err) => write!(f, "{err:#}"),
        }
    }
}

async fn transcribe_voice(
    telegram: &TelegramClient,
    gemini: &GeminiClient,
    voice: &Voice,
) -> Result<String, TranscribeFailure> {
    if let Some(size) = voice.file_size
        && size > MAX_AUDIO_BYTES
    {
        return Err(TranscribeFailure::TooLarge { size });
    }

    let file = telegram.get_file(&voice.file_id).await.map_err(|err| {
        if err.downcast_ref::<TelegramApiError>().is_some() {
            TranscribeFailure::FileUnavailable(err)
        } else {
            TranscribeFailure::Failed(err.context("Failed to look up voice file"))
        }
    })?;
    let file_path = file.file_path.ok_or_else(|| {
        TranscribeFailure::FileUnavailable(anyhow!("Telegram file missing file_path"))
    })?;

    let audio = telegram
        .download_file(&file_path)
        .await
        .map_err(TranscribeFailure::Failed)?;
    if audio.len() as u64 > MAX_AUDIO_BYTES {
        return Err(TranscribeFailure::TooLarge {
            size: audio.len() as u64,
        });
    }

    let mime_type = voice
        .mime_type
        .as_deref()
        .map(str::trim)
        .filter(|mime| !mime.is_empty())
        .unwrap_or(DEFAULT_VOICE_MIME);

    gemini
        .transcribe_audio(TRANSCRIBE_PROMPT, mime_type, &audio)
        .await
        .map_err(|err| TranscribeFailure::Failed(err.into()))
}
