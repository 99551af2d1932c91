//! Core VoxMind library (config, prompts, Gemini provider).

pub mod config;
pub mod prompts;
pub mod providers;
