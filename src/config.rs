//! # Bot Configuration Module
//!
//! Configuration structures for the bot process: transport credentials,
//! storage connection settings and the generative-text backend.

use anyhow::{Context, Result};
use std::env;
use tracing::warn;

// Constants for bot configuration
pub const DEFAULT_AI_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LANGUAGE: &str = "ru";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Generative-text backend settings
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// System-wide AI mode toggle
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible API
    pub api_url: String,
    /// Bearer token for the API
    pub api_key: Option<String>,
    /// Model name sent with every request
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: DEFAULT_AI_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_AI_MODEL.to_string(),
            timeout_secs: DEFAULT_AI_TIMEOUT_SECS,
        }
    }
}

impl AiConfig {
    /// AI mode is only usable when it is switched on and a key is present
    pub fn is_usable(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Configuration structure for the bot process
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram_token: String,
    pub database_url: String,
    pub db_max_connections: u32,
    /// Language used when the Telegram user has no supported language code
    pub default_language: String,
    pub ai: AiConfig,
}

impl BotConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        let telegram_token =
            env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let ai = AiConfig {
            enabled: env::var("AI_MODE_ENABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            api_url: env::var("AI_API_URL").unwrap_or_else(|_| DEFAULT_AI_API_URL.to_string()),
            api_key: env::var("AI_API_KEY").ok(),
            model: env::var("AI_MODEL").unwrap_or_else(|_| DEFAULT_AI_MODEL.to_string()),
            timeout_secs: parse_or_default("AI_TIMEOUT_SECS", DEFAULT_AI_TIMEOUT_SECS)?,
        };

        if ai.enabled && !ai.is_usable() {
            warn!("AI_MODE_ENABLED is set but AI_API_KEY is missing, AI mode stays off");
        }

        Ok(Self {
            telegram_token,
            database_url,
            db_max_connections: parse_or_default("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            default_language: env::var("DEFAULT_LANGUAGE")
                .unwrap_or_else(|_| DEFAULT_LANGUAGE.to_string()),
            ai,
        })
    }
}

/// Interpret common truthy spellings of an environment flag
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_or_default<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
