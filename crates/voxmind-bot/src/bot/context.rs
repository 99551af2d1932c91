use voxmind_core::config::Config;
use voxmind_core::providers::{GeminiClient, GeminiConfig};

use crate::bot::store::TranscriptStore;
use crate::bot::tasks::TaskRunner;
use crate::telegram::TelegramClient;

/// Everything an update handler needs, built once from `Config`.
pub struct BotContext {
    telegram: Option<TelegramClient>,
    gemini: Option<GeminiClient>,
    webhook_secret: Option<String>,
    bot_username: Option<String>,
    transcripts: TranscriptStore,
    tasks: TaskRunner,
}

impl BotContext {
    /// Builds clients for whichever credentials are present.
    ///
    /// Must be called inside a Tokio runtime (the task supervisor is spawned here).
    pub fn from_config(config: &Config) -> Self {
        let telegram = config
            .bot_token()
            .map(|token| TelegramClient::new(token.to_string(), &config.telegram.api_base_url));
        let gemini = GeminiConfig::from_config(config).map(GeminiClient::new);

        Self {
            telegram,
            gemini,
            webhook_secret: config.webhook_secret().map(str::to_string),
            bot_username: config.bot_username().map(str::to_string),
            transcripts: TranscriptStore::new(config.tasks.transcript_cache_size),
            tasks: TaskRunner::supervised(config.tasks.max_concurrent),
        }
    }

    pub fn telegram(&self) -> Option<&TelegramClient> {
        self.telegram.as_ref()
    }

    pub fn gemini(&self) -> Option<&GeminiClient> {
        self.gemini.as_ref()
    }

    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook_secret.as_deref()
    }

    /// Username that `/command@username` must name to be answered.
    pub fn bot_username(&self) -> Option<&str> {
        self.bot_username.as_deref()
    }

    pub fn transcripts(&self) -> &TranscriptStore {
        &self.transcripts
    }

    pub fn tasks(&self) -> &TaskRunner {
        &self.tasks
    }
}
