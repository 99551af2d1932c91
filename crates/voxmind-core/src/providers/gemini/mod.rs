//! Gemini provider helpers and clients.

pub mod api;
mod error;

pub use api::{GeminiClient, GeminiConfig, Part};
pub use error::{GeminiError, GeminiErrorKind, GeminiResult};
