//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

const DEFAULT_MAX_MESSAGES: usize = 10;
const DEFAULT_BATCH_SIZE: usize = 10;
const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;

/// Application configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: SecretString,
    pub assistant_id: String,
    /// Page size for the unread listing.
    pub max_messages: usize,
    /// Messages per enrichment batch.
    pub batch_size: usize,
    /// Budget for one generation run.
    pub ai_timeout: Duration,
}

impl AppConfig {
    /// Build config from environment variables. `OPENAI_API_KEY` and
    /// `OPENAI_ASSISTANT_ID` are required; the rest have defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let openai_api_key = require_env("OPENAI_API_KEY")?;
        let assistant_id = require_env("OPENAI_ASSISTANT_ID")?;

        let max_messages = env_or("DIGEST_MAX_MESSAGES", DEFAULT_MAX_MESSAGES);
        let batch_size = env_or("DIGEST_BATCH_SIZE", DEFAULT_BATCH_SIZE).max(1);
        let ai_timeout_secs = env_or("DIGEST_AI_TIMEOUT_SECS", DEFAULT_AI_TIMEOUT_SECS);

        Ok(Self {
            openai_api_key: SecretString::from(openai_api_key),
            assistant_id,
            max_messages,
            batch_size,
            ai_timeout: Duration::from_secs(ai_timeout_secs),
        })
    }
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
