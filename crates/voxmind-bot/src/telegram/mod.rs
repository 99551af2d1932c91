//! Minimal Telegram Bot API client.

use std::fmt;

use anyhow::{Result, anyhow, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

mod types;

pub use types::{
    CallbackQuery, Chat, InlineKeyboardButton, InlineKeyboardMarkup, Message, TelegramFile,
    Update, User, Voice,
};

const TELEGRAM_PARSE_MODE: &str = "HTML";

#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(token: String, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Sends an HTML message and returns the created message.
    ///
    /// # Errors
    /// Returns an error if the request fails or Telegram rejects it.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<Message> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: TELEGRAM_PARSE_MODE,
            reply_markup,
        };
        self.post("sendMessage", &request).await
    }

    /// Replaces the text (and keyboard) of an existing message.
    ///
    /// # Errors
    /// Returns an error if the request fails or Telegram rejects it.
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<()> {
        let request = EditMessageTextRequest {
            chat_id,
            message_id,
            text,
            parse_mode: TELEGRAM_PARSE_MODE,
            reply_markup,
        };
        // `result` is the edited Message, or `true` for inline messages.
        let _: serde_json::Value = self.post("editMessageText", &request).await?;
        Ok(())
    }

    /// Clears the loading indicator on a pressed inline button.
    ///
    /// # Errors
    /// Returns an error if the request fails or Telegram rejects it.
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
    ) -> Result<()> {
        let request = AnswerCallbackQueryRequest {
            callback_query_id,
            text,
        };
        let _: bool = self.post("answerCallbackQuery", &request).await?;
        Ok(())
    }

    /// Returns the bot's own user, used to recognise `/command@username`.
    ///
    /// # Errors
    /// Returns an error if the request fails or Telegram rejects it.
    pub async fn get_me(&self) -> Result<User> {
        self.post("getMe", &serde_json::json!({})).await
    }

    pub async fn get_file(&self, file_id: &str) -> Result<TelegramFile> {
        let request = GetFileRequest { file_id };
        self.post("getFile", &request).await
    }

    pub async fn download_file(&self, file_path: &str) -> Result<Vec<u8>> {
        let url = format!("{}/file/bot{}/{}", self.base_url, self.token, file_path);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| anyhow!("Telegram file download failed: {}", redact(err)))?;

        if !response.status().is_success() {
            bail!(
                "Telegram file download failed with status {}",
                response.status()
            );
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| anyhow!("Failed to read Telegram file bytes: {}", redact(err)))?;
        Ok(bytes.to_vec())
    }

    /// Registers `url` as the webhook target for this bot.
    ///
    /// # Errors
    /// Returns an error if the request fails or Telegram rejects it.
    pub async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<()> {
        let request = SetWebhookRequest {
            url,
            secret_token,
            allowed_updates: &["message", "callback_query"],
        };
        let _: bool = self.post("setWebhook", &request).await?;
        Ok(())
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, method: &str, body: &B) -> Result<T> {
        let url = format!("{}/bot{}/{}", self.base_url, self.token, method);
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| anyhow!("Telegram {} request failed: {}", method, redact(err)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| anyhow!("Failed to read Telegram {} response: {}", method, redact(err)))?;

        // Gateways in front of the Bot API answer with HTML, not the JSON envelope.
        let Ok(payload) = serde_json::from_str::<TelegramResponse<T>>(&text) else {
            bail!(
                "Telegram {} returned HTTP {}: {}",
                method,
                status,
                text.trim().chars().take(200).collect::<String>()
            );
        };

        if !payload.ok {
            return Err(TelegramApiError {
                method: method.to_string(),
                description: payload
                    .description
                    .unwrap_or_else(|| "Telegram API error".to_string()),
            }
            .into());
        }

        payload
            .result
            .ok_or_else(|| anyhow!("Telegram {} response missing result", method))
    }
}

/// Telegram answered with `ok: false`.
///
/// Transport and decoding failures are plain `anyhow` errors, so callers can
/// tell a rejected request apart from one that never got an answer.
#[derive(Debug, Clone)]
pub struct TelegramApiError {
    pub method: String,
    pub description: String,
}

impl fmt::Display for TelegramApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}

impl std::error::Error for TelegramApiError {}

/// Reqwest errors embed the request URL, which carries the bot token.
fn redact(err: reqwest::Error) -> String {
    err.without_url().to_string()
}

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
struct EditMessageTextRequest<'a> {
    chat_id: i64,
    message_id: i64,
    text: &'a str,
    parse_mode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
struct AnswerCallbackQueryRequest<'a> {
    callback_query_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct GetFileRequest<'a> {
    file_id: &'a str,
}

#[derive(Debug, Serialize)]
struct SetWebhookRequest<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_token: Option<&'a str>,
    allowed_updates: &'a [&'a str],
}
