use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path Telegram posts updates to.
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            webhook_path: "/webhook".to_string(),
        }
    }
}

impl ServerConfig {
    /// Resolves `host:port` into a socket address.
    ///
    /// # Errors
    /// Returns an error if the host is not a valid IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

/// Telegram Bot API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token for Telegram API.
    pub bot_token: Option<String>,
    pub api_base_url: String,
    /// Public URL registered with `setWebhook` on startup.
    pub webhook_url: Option<String>,
    /// Expected value of the `X-Telegram-Bot-Api-Secret-Token` header.
    pub webhook_secret: Option<String>,
    /// Username without `@`; looked up with `getMe` at startup when unset.
    pub bot_username: Option<String>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base_url: Config::DEFAULT_TELEGRAM_BASE_URL.to_string(),
            webhook_url: None,
            webhook_secret: None,
            bot_username: None,
        }
    }
}

/// Gemini (Generative Language API) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: Config::DEFAULT_GEMINI_MODEL.to_string(),
            base_url: Config::DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }
}

/// Background task limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Upper bound on concurrently running transcription/correction tasks.
    pub max_concurrent: usize,
    /// Number of transcripts kept for the correction button.
    pub transcript_cache_size: usize,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            transcript_cache_size: 1024,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub telegram: TelegramConfig,
    pub gemini: GeminiSettings,
    pub tasks: TaskConfig,
}

impl Config {
    pub const DEFAULT_TELEGRAM_BASE_URL: &str = "https://api.telegram.org";
    pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

    /// Loads the config file, then applies environment overrides.
    ///
    /// # Errors
    /// Returns an error if the file cannot be parsed or an override is malformed.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&paths::config_path())?;
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            let config: Self = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Overlays environment variables using the given lookup.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    /// Returns an error if a numeric variable does not parse or a base URL is invalid.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("PORT must be a port number, got {port:?}"))?;
        }
        if let Some(path) = get("WEBHOOK_PATH") {
            self.server.webhook_path = path;
        }

        if let Some(token) = get("BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(url) = get("TELEGRAM_API_BASE_URL") {
            self.telegram.api_base_url = url;
        }
        if let Some(url) = get("WEBHOOK_URL") {
            self.telegram.webhook_url = Some(url);
        }
        if let Some(secret) = get("WEBHOOK_SECRET") {
            self.telegram.webhook_secret = Some(secret);
        }
        if let Some(username) = get("BOT_USERNAME") {
            self.telegram.bot_username = Some(username);
        }

        if let Some(key) = get("GEMINI_API_KEY") {
            self.gemini.api_key = Some(key);
        }
        if let Some(model) = get("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(url) = get("GEMINI_BASE_URL") {
            self.gemini.base_url = url;
        }

        if let Some(limit) = get("MAX_CONCURRENT_TASKS") {
            self.tasks.max_concurrent = limit.parse().with_context(|| {
                format!("MAX_CONCURRENT_TASKS must be a positive integer, got {limit:?}")
            })?;
        }

        self.validate()
    }

    /// Bot token, if configured and non-blank.
    pub fn bot_token(&self) -> Option<&str> {
        non_blank(self.telegram.bot_token.as_deref())
    }

    /// Gemini API key, if configured and non-blank.
    pub fn gemini_api_key(&self) -> Option<&str> {
        non_blank(self.gemini.api_key.as_deref())
    }

    pub fn webhook_url(&self) -> Option<&str> {
        non_blank(self.telegram.webhook_url.as_deref())
    }

    pub fn webhook_secret(&self) -> Option<&str> {
        non_blank(self.telegram.webhook_secret.as_deref())
    }

    /// Bot username with any leading `@` removed.
    pub fn bot_username(&self) -> Option<&str> {
        non_blank(
            self.telegram
                .bot_username
                .as_deref()
                .map(|name| name.trim().trim_start_matches('@')),
        )
    }

    fn validate(&self) -> Result<()> {
        validate_url(&self.telegram.api_base_url, "Telegram")?;
        validate_url(&self.gemini.base_url, "Gemini")?;
        if !self.server.webhook_path.starts_with('/') {
            bail!(
                "webhook_path must start with '/', got {:?}",
                self.server.webhook_path
            );
        }
        if self.server.webhook_path == "/" {
            bail!("webhook_path must not be the liveness path '/'");
        }
        if self.tasks.max_concurrent == 0 {
            bail!("tasks.max_concurrent must be at least 1");
        }
        if self.tasks.transcript_cache_size == 0 {
            bail!("tasks.transcript_cache_size must be at least 1");
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn validate_url(url: &str, name: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url).with_context(|| format!("Invalid {name} base URL: {url}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("{name} base URL must use http or https: {url}");
    }
    Ok(())
}

pub mod paths {
    //! Config file location.
    //!
    //! Resolution order:
    //! 1. `VOXMIND_CONFIG` environment variable (if set)
    //! 2. `voxmind.toml` in the working directory

    use std::path::PathBuf;

    pub fn config_path() -> PathBuf {
        std::env::var("VOXMIND_CONFIG")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map_or_else(|| PathBuf::from("voxmind.toml"), PathBuf::from)
    }
}
