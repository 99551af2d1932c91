//! User-facing texts and message layouts.
//!
//! The transcript message is `header \n\n body`; the correction button reads
//! the body back from that layout when the transcript store has no entry.

use htmlescape::encode_minimal;

use crate::telegram::InlineKeyboardMarkup;

pub const LIVENESS_TEXT: &str = "✅ VoxMind Bot is running!";
pub const GREETING: &str = "👋 سلام! ربات فعال است.\nویس بفرستید.";
pub const PLACEHOLDER_TEXT: &str = "⏳...";
pub const CALLBACK_ACK_TEXT: &str = "⏳ در حال پردازش...";
pub const MISSING_GEMINI_KEY_VOICE: &str = "❌ خطا: کلید GEMINI_API_KEY تنظیم نشده است.";
pub const MISSING_GEMINI_KEY_CORRECT: &str = "❌ کلید جمینای تنظیم نشده است.";
pub const FILE_NOT_FOUND: &str = "❌ دریافت فایل صوتی از تلگرام ممکن نشد.";
pub const TEXT_NOT_FOUND: &str = "متن یافت نشد.";

macro_rules! transcript_title {
    () => {
        "متن خام:"
    };
}

pub const TRANSCRIPT_HEADER: &str = concat!("📝 <b>", transcript_title!(), "</b>");
/// The header as Telegram shows it once the `<b>` entity is parsed out.
pub const TRANSCRIPT_HEADER_PLAIN: &str = concat!("📝 ", transcript_title!());
pub const CORRECT_ACTION: &str = "do_correct";
pub const CORRECT_BUTTON_LABEL: &str = "Correct 🇬🇧";

const SECTION_SEPARATOR: &str = "\n\n";
/// Telegram rejects message texts longer than this (after entity parsing).
const MAX_MESSAGE_CHARS: usize = 4096;

pub fn correct_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::single(CORRECT_BUTTON_LABEL, CORRECT_ACTION)
}

/// Placeholder contents once transcription succeeded.
pub fn transcript_message(transcript: &str) -> String {
    let budget =
        MAX_MESSAGE_CHARS - visible_len(TRANSCRIPT_HEADER_PLAIN) - SECTION_SEPARATOR.len();
    format!(
        "{TRANSCRIPT_HEADER}{SECTION_SEPARATOR}{}",
        encode_minimal(&truncate_chars(transcript, budget))
    )
}

/// Final message after correction: original on top, model output below.
pub fn correction_message(original: &str, corrected: &str) -> String {
    let overhead = visible_len("📝 ") + SECTION_SEPARATOR.len() + visible_len("🎓 ");
    let budget = MAX_MESSAGE_CHARS - overhead;
    let corrected_budget = budget.saturating_sub(visible_len(original)).max(budget / 2);
    let corrected = truncate_chars(corrected, corrected_budget);
    let original = truncate_chars(original, budget - visible_len(&corrected));
    format!(
        "📝 {}{SECTION_SEPARATOR}🎓 {}",
        encode_minimal(&original),
        encode_minimal(&corrected)
    )
}

/// `❌ <what failed>: <error>`
pub fn failure_message(what: &str, error: &str) -> String {
    let line = format!("❌ {what}: {error}");
    encode_minimal(&truncate_chars(&line, MAX_MESSAGE_CHARS))
}

/// File lookup rejected by Telegram, with its reason on a second line.
pub fn file_unavailable_message(reason: &str) -> String {
    let budget = MAX_MESSAGE_CHARS - visible_len(FILE_NOT_FOUND) - 1;
    format!(
        "{FILE_NOT_FOUND}\n{}",
        encode_minimal(&truncate_chars(reason, budget))
    )
}

/// Recovers the transcript from a rendered transcript message.
///
/// Returns the second `\n\n`-separated segment, or `None` when the layout
/// doesn't match.
pub fn extract_original_text(message_text: Option<&str>) -> Option<&str> {
    message_text?
        .split(SECTION_SEPARATOR)
        .nth(1)
        .filter(|segment| !segment.trim().is_empty())
}

fn visible_len(text: &str) -> usize {
    text.chars().count()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}
