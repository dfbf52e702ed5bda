//! Blocking HTTP client for an OpenAI-compatible chat-completions endpoint.
//!
//! `GroqClient` implements `TextGenerator`. Every request is bounded by the
//! configured timeout. Transport errors, `429` and `5xx` responses are
//! retried up to `max_retries` times with a doubling backoff; anything else
//! fails immediately.

use std::thread;
use std::time::Duration;

use reqwest::{blocking::Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};

use callcenter_contracts::{
    error::{CallcenterError, CallcenterResult},
    script::ScriptPayload,
};
use callcenter_core::traits::TextGenerator;

use crate::{
    config::LlmConfig,
    wire::{strip_code_fence, ChatRequest, ChatResponse},
};

pub struct GroqClient {
    http: Client,
    config: LlmConfig,
    api_key: SecretString,
}

impl std::fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

impl GroqClient {
    /// Build a client from `config`.
    ///
    /// Fails with `ConfigError` when the API key is missing or a setting is
    /// unusable, and with `GraphConstruction` when the HTTP client cannot be
    /// created.
    pub fn new(config: LlmConfig) -> CallcenterResult<Self> {
        config.validate()?;
        let api_key = config.api_key.clone().ok_or_else(|| CallcenterError::ConfigError {
            reason: "language-model API key is not set".to_string(),
        })?;

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CallcenterError::GraphConstruction {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { http, config, api_key })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Send `request`, retrying retryable failures.
    fn complete(&self, request: &ChatRequest) -> CallcenterResult<ChatResponse> {
        let url = self.config.completions_url();

        send_with_retries(self.config.max_retries, RETRY_BASE_DELAY, |attempt| {
            debug!(attempt, model = %request.model, "sending chat completion");

            let response = self
                .http
                .post(&url)
                .bearer_auth(self.api_key.expose_secret())
                .json(request)
                .send()
                .map_err(|e| AttemptFailure::retryable(format!("request failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let reason = format!("backend returned {status}");
                return Err(if is_retryable(status) {
                    AttemptFailure::retryable(reason)
                } else {
                    AttemptFailure::terminal(reason)
                });
            }

            response
                .json::<ChatResponse>()
                .map_err(|e| AttemptFailure::terminal(format!("unreadable completion response: {e}")))
        })
    }
}

// ── Retries ──────────────────────────────────────────────────────────────────

/// Delay before the first retry; doubled for each later one.
pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);
pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(4);

/// Why one attempt failed, and whether another attempt may help.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    pub reason: String,
    pub retryable: bool,
}

impl AttemptFailure {
    pub fn retryable(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            retryable: true,
        }
    }

    pub fn terminal(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            retryable: false,
        }
    }
}

/// Backoff before retry number `retry` (1-based), capped at `RETRY_MAX_DELAY`.
pub fn retry_delay(base: Duration, retry: u32) -> Duration {
    let mut delay = base;
    for _ in 1..retry.min(32) {
        delay = delay.saturating_mul(2);
    }
    delay.min(RETRY_MAX_DELAY)
}

/// Run `send` until it succeeds, fails terminally, or `max_retries` extra
/// attempts are spent. `send` receives the 1-based attempt number.
pub fn send_with_retries<T>(
    max_retries: u32,
    base_delay: Duration,
    mut send: impl FnMut(u32) -> Result<T, AttemptFailure>,
) -> CallcenterResult<T> {
    let attempts = max_retries.saturating_add(1);
    let mut last_error = String::from("no attempt was made");

    for attempt in 1..=attempts {
        match send(attempt) {
            Ok(value) => return Ok(value),
            Err(failure) => {
                last_error = failure.reason;
                if !failure.retryable || attempt == attempts {
                    break;
                }
                let delay = retry_delay(base_delay, attempt);
                warn!(attempt, error = %last_error, delay_ms = delay.as_millis() as u64, "chat completion failed; retrying");
                thread::sleep(delay);
            }
        }
    }

    Err(CallcenterError::Generation { reason: last_error })
}

/// `429` and every `5xx` are worth another attempt.
pub fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Parse the content of a JSON-mode completion.
pub fn parse_structured_content(content: &str) -> CallcenterResult<Value> {
    serde_json::from_str(strip_code_fence(content)).map_err(|e| CallcenterError::Generation {
        reason: format!("structured completion is not valid JSON: {e}"),
    })
}

impl TextGenerator for GroqClient {
    fn invoke(&self, prompt: &str) -> CallcenterResult<ScriptPayload> {
        let request = ChatRequest::text(&self.config.model, self.config.temperature, prompt);
        let message = self
            .complete(&request)?
            .into_message()
            .ok_or_else(|| CallcenterError::Generation {
                reason: "completion contained no choices".to_string(),
            })?;
        Ok(ScriptPayload::Message(message))
    }

    fn invoke_structured(&self, prompt: &str, schema: &Value) -> CallcenterResult<Value> {
        let request =
            ChatRequest::structured(&self.config.model, self.config.temperature, prompt, schema);
        let message = self
            .complete(&request)?
            .into_message()
            .ok_or_else(|| CallcenterError::Generation {
                reason: "completion contained no choices".to_string(),
            })?;
        parse_structured_content(&message.content)
    }
}
