//! Configuration, built from environment variables.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Completion service configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: SecretString,
    /// Base URL of the chat-completions endpoint (overridable for tests).
    pub api_base: String,
    pub model: String,
}

/// Triage core configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    /// Redis connection string. In-memory queue and credential backends
    /// are used when unset.
    pub redis_url: Option<String>,
    pub gmail_api_base: String,
    pub outlook_api_base: String,
    /// Product name used in reply subject lines.
    pub product_name: String,
    /// Worker tasks spawned per named queue.
    pub workers_per_queue: usize,
    /// Bound applied to each external call individually.
    pub call_timeout: Duration,
}

impl Config {
    /// Build config from environment variables.
    /// Fails only when `OPENAI_API_KEY` is absent; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let api_base = std::env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());

        let model =
            std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());

        let redis_url = std::env::var("REDIS_URL").ok();

        let gmail_api_base = std::env::var("GMAIL_API_BASE")
            .unwrap_or_else(|_| "https://gmail.googleapis.com/gmail/v1".to_string());

        let outlook_api_base = std::env::var("OUTLOOK_API_BASE")
            .unwrap_or_else(|_| "https://graph.microsoft.com/v1.0".to_string());

        let product_name =
            std::env::var("PRODUCT_NAME").unwrap_or_else(|_| "ReachInbox".to_string());

        let workers_per_queue: usize = std::env::var("WORKERS_PER_QUEUE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3);
        if workers_per_queue == 0 {
            // a pool with zero workers would accept jobs and never run them
            return Err(ConfigError::InvalidValue {
                key: "WORKERS_PER_QUEUE".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let call_timeout_secs: u64 = std::env::var("CALL_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            llm: LlmConfig {
                api_key: SecretString::from(api_key),
                api_base,
                model,
            },
            redis_url,
            gmail_api_base,
            outlook_api_base,
            product_name,
            workers_per_queue,
            call_timeout: Duration::from_secs(call_timeout_secs),
        })
    }
}
