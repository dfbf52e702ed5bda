//! Connection settings for the hosted language model.

use std::time::Duration;

use secrecy::SecretString;

use callcenter_contracts::error::{CallcenterError, CallcenterResult};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-oss-20b";
pub const DEFAULT_API_KEY_ENV: &str = "GROQ_API_KEY";
/// Upper bound on `max_retries`; a turn waits on every attempt.
pub const MAX_RETRIES_LIMIT: u32 = 5;

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Bearer token. `None` means the backend cannot be constructed.
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
    /// Extra attempts after the first one for retryable failures.
    pub max_retries: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_secs: 30,
            max_retries: 1,
            temperature: 0.2,
        }
    }
}

impl LlmConfig {
    /// Fill `api_key` from the environment variable `var`.
    ///
    /// An unset or blank variable leaves the key empty.
    pub fn with_api_key_from_env(mut self, var: &str) -> Self {
        self.api_key = std::env::var(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(SecretString::from);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `{base_url}/chat/completions`, tolerating a trailing slash.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Reject settings the client cannot work with.
    pub fn validate(&self) -> CallcenterResult<()> {
        if self.api_key.is_none() {
            return Err(CallcenterError::ConfigError {
                reason: "language-model API key is not set".to_string(),
            });
        }
        if self.model.trim().is_empty() {
            return Err(CallcenterError::ConfigError {
                reason: "language-model name is empty".to_string(),
            });
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(CallcenterError::ConfigError {
                reason: format!("base_url '{}' is not an http(s) URL", self.base_url),
            });
        }
        if self.timeout_secs == 0 {
            return Err(CallcenterError::ConfigError {
                reason: "timeout_secs must be greater than zero".to_string(),
            });
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(CallcenterError::ConfigError {
                reason: format!(
                    "max_retries {} exceeds the limit of {}",
                    self.max_retries, MAX_RETRIES_LIMIT
                ),
            });
        }
        Ok(())
    }
}
