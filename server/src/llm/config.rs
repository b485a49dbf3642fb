//! LLM configuration parsed from environment variables.

use super::types::{GenerationConfig, LlmError};

pub const DEFAULT_API_KEY_ENV: &str = "API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_LLM_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Fixed sampling: every request uses the same configuration.
pub const GENERATION: GenerationConfig = GenerationConfig { temperature: 0.9, top_k: 1, top_p: 1.0 };

#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub generation: GenerationConfig,
}

impl LlmConfig {
    /// Build typed LLM config from environment variables.
    ///
    /// Optional:
    /// - `LLM_API_KEY_ENV`: names the env var holding the key (default `API_KEY`)
    /// - `LLM_MODEL`: default `gemini-2.5-flash`
    /// - `LLM_BASE_URL`: default Gemini v1beta endpoint
    /// - `LLM_CONNECT_TIMEOUT_SECS`: default 10, also used when unparsable
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::MissingApiKey`] when the key variable is unset or empty.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`LlmConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LlmError> {
        let key_var = lookup("LLM_API_KEY_ENV").unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string());
        let api_key = lookup(&key_var)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey { var: key_var.clone() })?;

        let model = lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = lookup("LLM_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let connect_timeout_secs = parse_u64_or(
            lookup("LLM_CONNECT_TIMEOUT_SECS"),
            "LLM_CONNECT_TIMEOUT_SECS",
            DEFAULT_LLM_CONNECT_TIMEOUT_SECS,
        );

        Ok(Self { api_key, model, base_url, connect_timeout_secs, generation: GENERATION })
    }
}

fn parse_u64_or(raw: Option<String>, key: &str, default: u64) -> u64 {
    match raw.map(|v| v.trim().parse::<u64>()) {
        Some(Ok(value)) => value,
        Some(Err(_)) => {
            tracing::warn!(key, default, "invalid numeric setting, using default");
            default
        }
        None => default,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
