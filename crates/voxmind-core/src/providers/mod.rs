//! Remote model providers.

pub mod gemini;

pub use gemini::{GeminiClient, GeminiConfig, GeminiError, GeminiErrorKind, GeminiResult};
