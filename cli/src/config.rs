//! Application configuration.
//!
//! Read from an optional TOML file, then overridden by `CALLCENTER_*`
//! environment variables. Every field has a default, so an empty file (or
//! no file) is a valid configuration:
//!
//! ```toml
//! [llm]
//! base_url = "https://api.groq.com/openai/v1"
//! model = "openai/gpt-oss-20b"
//! api_key_env = "GROQ_API_KEY"
//! timeout_secs = 30
//! max_retries = 1
//! temperature = 0.2
//!
//! [call_log]
//! dir = "call_logs"
//! enabled = true
//!
//! [nlu]
//! keywords_path = "keywords.toml"
//!
//! [logging]
//! level = "warn"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use callcenter_contracts::error::{CallcenterError, CallcenterResult};
use callcenter_llm::{
    config::{DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL},
    LlmConfig,
};
use callcenter_nlu::KeywordTable;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "callcenter.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub llm: LlmSection,
    pub call_log: CallLogSection,
    pub nlu: NluSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmSection {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub temperature: f32,
}

impl Default for LlmSection {
    fn default() -> Self {
        let defaults = LlmConfig::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: defaults.timeout_secs,
            max_retries: defaults.max_retries,
            temperature: defaults.temperature,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CallLogSection {
    pub dir: PathBuf,
    pub enabled: bool,
}

impl Default for CallLogSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("call_logs"),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NluSection {
    /// TOML keyword table replacing the built-in one.
    pub keywords_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `DEFAULT_CONFIG_FILE` is
    /// used if present, otherwise the defaults. Environment overrides are
    /// applied last.
    pub fn load(path: Option<&Path>) -> CallcenterResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> CallcenterResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| CallcenterError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> CallcenterResult<Self> {
        toml::from_str(s).map_err(|e| CallcenterError::ConfigError {
            reason: format!("failed to parse config TOML: {}", e),
        })
    }

    /// Apply `CALLCENTER_*` overrides. `lookup` resolves a variable name.
    ///
    /// Unparseable numeric overrides are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("CALLCENTER_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = lookup("CALLCENTER_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = lookup("CALLCENTER_LLM_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.llm.timeout_secs = v;
        }
        if let Some(v) = lookup("CALLCENTER_CALL_LOG_DIR") {
            self.call_log.dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("CALLCENTER_LOG_LEVEL") {
            self.logging.level = v;
        }
    }

    /// Backend settings, with the API key read from `llm.api_key_env`.
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            base_url: self.llm.base_url.clone(),
            model: self.llm.model.clone(),
            api_key: None,
            timeout_secs: self.llm.timeout_secs,
            max_retries: self.llm.max_retries,
            temperature: self.llm.temperature,
        }
        .with_api_key_from_env(&self.llm.api_key_env)
    }

    /// The configured keyword table, or the built-in one.
    pub fn keyword_table(&self) -> CallcenterResult<KeywordTable> {
        match &self.nlu.keywords_path {
            Some(path) => KeywordTable::from_file(path),
            None => Ok(KeywordTable::default()),
        }
    }
}
