use std::fmt;

use serde_json::Value;

/// Error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeminiErrorKind {
    /// HTTP status error (4xx, 5xx)
    HttpStatus,
    /// Connection timeout or request timeout
    Timeout,
    /// Failed to parse the response body
    Parse,
    /// Response carried no usable text
    ApiError,
    /// Prompt or candidate rejected by safety filters
    Blocked,
}

impl fmt::Display for GeminiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeminiErrorKind::HttpStatus => write!(f, "http_status"),
            GeminiErrorKind::Timeout => write!(f, "timeout"),
            GeminiErrorKind::Parse => write!(f, "parse"),
            GeminiErrorKind::ApiError => write!(f, "api_error"),
            GeminiErrorKind::Blocked => write!(f, "blocked"),
        }
    }
}

/// Structured error from the Gemini API with kind and details.
#[derive(Debug, Clone)]
pub struct GeminiError {
    pub kind: GeminiErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl GeminiError {
    pub fn new(kind: GeminiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an HTTP status error, preferring `error.message` from a JSON body.
    pub fn http_status(status: u16, body: &str) -> Self {
        if body.is_empty() {
            return Self::new(GeminiErrorKind::HttpStatus, format!("HTTP {status}"));
        }

        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| {
                json.get("error")
                    .and_then(|error| error.get("message"))
                    .and_then(Value::as_str)
                    .map(|msg| format!("HTTP {status}: {msg}"))
            })
            .unwrap_or_else(|| format!("HTTP {status}"));

        Self {
            kind: GeminiErrorKind::HttpStatus,
            message,
            details: Some(body.to_string()),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(GeminiErrorKind::Timeout, message)
    }

    pub fn parse(message: impl Into<String>, body: &str) -> Self {
        Self {
            kind: GeminiErrorKind::Parse,
            message: message.into(),
            details: Some(body.to_string()),
        }
    }

    pub fn blocked(reason: &str) -> Self {
        Self::new(
            GeminiErrorKind::Blocked,
            format!("Gemini blocked the request ({reason})"),
        )
    }

    /// Classifies a reqwest error.
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::timeout(format!("Request timed out: {e}"))
        } else if e.is_connect() {
            Self::timeout(format!("Connection failed: {e}"))
        } else if e.is_request() {
            Self::new(GeminiErrorKind::HttpStatus, format!("Request error: {e}"))
        } else {
            Self::new(GeminiErrorKind::HttpStatus, format!("Network error: {e}"))
        }
    }
}

impl fmt::Display for GeminiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for GeminiError {}

pub type GeminiResult<T> = std::result::Result<T, GeminiError>;
