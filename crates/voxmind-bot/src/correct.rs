use anyhow::{Context, Result};
use tracing::{info, warn};
use voxmind_core::prompts::correction_input;
use voxmind_core::providers::GeminiClient;

use crate::bot::TaskRunner;
use crate::render::{correction_message, failure_message};
use crate::telegram::TelegramClient;

pub(crate) struct CorrectionJob {
    pub chat_id: i64,
    pub message_id: i64,
    pub original_text: String,
}

pub(crate) fn spawn_correction(
    tasks: &TaskRunner,
    telegram: TelegramClient,
    gemini: GeminiClient,
    job: CorrectionJob,
) {
    let label = format!("correct chat={} message={}", job.chat_id, job.message_id);
    tasks.spawn(label, async move {
        run_correction(&telegram, &gemini, job).await
    });
}

/// On failure a new message is sent; the target message is left as it was.
async fn run_correction(
    telegram: &TelegramClient,
    gemini: &GeminiClient,
    job: CorrectionJob,
) -> Result<()> {
    let CorrectionJob {
        chat_id,
        message_id,
        original_text,
    } = job;

    let outcome: Result<()> = async {
        let corrected = gemini
            .generate_from_text(&correction_input(&original_text))
            .await?;
        telegram
            .edit_message_text(
                chat_id,
                message_id,
                &correction_message(&original_text, &corrected),
                None,
            )
            .await
            .context("Failed to edit message with correction")
    }
    .await;

    match outcome {
        Ok(()) => {
            info!(chat_id, message_id, "Correction finished");
            Ok(())
        }
        Err(err) => {
            warn!(chat_id, message_id, error = %format!("{err:#}"), "Correction failed");
            telegram
                .send_message(
                    chat_id,
                    &failure_message("خطا در اصلاح متن", &format!("{err:#}")),
                    None,
                )
                .await
                .context("Failed to report correction failure")?;
            Ok(())
        }
    }
}
