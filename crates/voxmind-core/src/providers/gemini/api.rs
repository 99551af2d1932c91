//! Gemini API key provider (Generative Language API).

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Value, json};

use super::error::{GeminiError, GeminiErrorKind, GeminiResult};
use crate::config::Config;

const USER_AGENT: &str = concat!("voxmind/", env!("CARGO_PKG_VERSION"));

/// Gemini API configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl GeminiConfig {
    /// Builds the client config, or `None` when no API key is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let api_key = config.gemini_api_key()?;
        Some(Self {
            api_key: api_key.to_string(),
            base_url: config.gemini.base_url.trim_end_matches('/').to_string(),
            model: config.gemini.model.clone(),
        })
    }
}

/// One piece of a user turn.
#[derive(Debug, Clone, Copy)]
pub enum Part<'a> {
    Text(&'a str),
    InlineData { mime_type: &'a str, data: &'a [u8] },
}

/// Gemini client.
#[derive(Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Transcribes an audio clip using the given instruction prompt.
    ///
    /// # Errors
    /// Returns an error if the request fails or the response has no text.
    pub async fn transcribe_audio(
        &self,
        prompt: &str,
        mime_type: &str,
        audio: &[u8],
    ) -> GeminiResult<String> {
        self.generate_text(&[
            Part::Text(prompt),
            Part::InlineData {
                mime_type,
                data: audio,
            },
        ])
        .await
    }

    /// Runs a text-only prompt.
    ///
    /// # Errors
    /// Returns an error if the request fails or the response has no text.
    pub async fn generate_from_text(&self, prompt: &str) -> GeminiResult<String> {
        self.generate_text(&[Part::Text(prompt)]).await
    }

    /// Calls `generateContent` and returns the concatenated text parts.
    ///
    /// # Errors
    /// Returns an error if the request fails or the response has no text.
    pub async fn generate_text(&self, parts: &[Part<'_>]) -> GeminiResult<String> {
        let request = build_generate_request(parts);
        tracing::debug!(model = %self.config.model, parts = parts.len(), "Gemini generateContent");
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );

        let response = self
            .http
            .post(url)
            .headers(build_headers(&self.config.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| GeminiError::from_reqwest(&e))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), model = %self.config.model, "Gemini request failed");
            return Err(GeminiError::http_status(status.as_u16(), &body));
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| GeminiError::parse(format!("Failed to parse Gemini response: {e}"), &body))?;
        parse_generate_response(&value)
    }
}

fn build_generate_request(parts: &[Part<'_>]) -> Value {
    let parts: Vec<Value> = parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => json!({ "text": text }),
            Part::InlineData { mime_type, data } => json!({
                "inline_data": {
                    "mime_type": mime_type,
                    "data": BASE64.encode(data),
                }
            }),
        })
        .collect();

    json!({
        "contents": [{
            "role": "user",
            "parts": parts,
        }]
    })
}

fn parse_generate_response(value: &Value) -> GeminiResult<String> {
    if let Some(reason) = value
        .get("promptFeedback")
        .and_then(|feedback| feedback.get("blockReason"))
        .and_then(Value::as_str)
    {
        return Err(GeminiError::blocked(reason));
    }

    let Some(candidate) = value
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
    else {
        return Err(GeminiError::new(
            GeminiErrorKind::ApiError,
            "Gemini returned no candidates",
        ));
    };

    let text: String = candidate
        .get("content")
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    let trimmed = text.trim();
    if !trimmed.is_empty() {
        return Ok(trimmed.to_string());
    }

    match candidate.get("finishReason").and_then(Value::as_str) {
        Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")) => {
            Err(GeminiError::blocked(reason))
        }
        _ => Err(GeminiError::new(
            GeminiErrorKind::ApiError,
            "Gemini returned an empty response",
        )),
    }
}

fn build_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-goog-api-key",
        HeaderValue::from_str(api_key).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    headers.insert("accept", HeaderValue::from_static("application/json"));
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers.insert("user-agent", HeaderValue::from_static(USER_AGENT));
    headers
}
