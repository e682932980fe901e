use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_model() -> String {
    "gemini-pro".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_bind_address() -> String {
    "127.0.0.1:8000".to_string()
}

impl Config {
    /// Load `.env`, then the TOML file at `path` (if any), then apply
    /// environment overrides.
    ///
    /// A missing file is only an error when the caller named it explicitly;
    /// the default `config.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!("Ignoring unreadable .env file: {}", e);
            }
        }

        let file = match path {
            Some(path) => Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?,
            ),
            None => std::fs::read_to_string(DEFAULT_CONFIG_PATH).ok(),
        };

        let config = Self::from_sources(file.as_deref(), |key| std::env::var(key).ok())?;
        config.warn_missing_credentials();
        Ok(config)
    }

    /// Build a config from optional TOML text and an environment lookup.
    pub fn from_sources<F>(toml_text: Option<&str>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Config = match toml_text {
            Some(text) => toml::from_str(text).context("Failed to parse config file")?,
            None => Config::default(),
        };

        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty("TELEGRAM_BOT_TOKEN") {
            config.telegram.bot_token = token;
        }
        if let Some(key) = non_empty("GEMINI_API_KEY") {
            config.gemini.api_key = key;
        }
        if let Some(model) = non_empty("GEMINI_MODEL") {
            config.gemini.model = model;
        }
        if let Some(url) = non_empty("GEMINI_BASE_URL") {
            config.gemini.base_url = url;
        }
        if let Some(addr) = non_empty("BIND_ADDRESS") {
            config.server.bind_address = addr;
        }

        Ok(config)
    }

    // Credentials are not validated; the external APIs reject them on first use.
    fn warn_missing_credentials(&self) {
        if self.telegram.bot_token.is_empty() {
            warn!("TELEGRAM_BOT_TOKEN is not set");
        }
        if self.gemini.api_key.is_empty() {
            warn!("GEMINI_API_KEY is not set");
        }
    }
}
