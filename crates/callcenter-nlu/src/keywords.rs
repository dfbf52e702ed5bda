//! Deterministic keyword fallback for intent classification.
//!
//! A `KeywordTable` holds one keyword list per canonical intent. It is built
//! in, or loaded from TOML so operators can tune it without a rebuild:
//!
//! ```toml
//! [[intents]]
//! intent = "Billing Issue"
//! keywords = ["bill", "charge", "refund"]
//! ```
//!
//! Scoring algorithm:
//!
//! 1. For every intent, count the occurrences of each of its keywords in the
//!    lower-cased text. A keyword only counts where it starts a word, so
//!    `"charge"` matches "charges" but not "recharge".
//! 2. The intent with the highest total wins. Ties go to the intent listed
//!    first in `Intent::ALL`.
//! 3. With no matches at all, the answer is `DEFAULT_INTENT`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use callcenter_contracts::{
    error::{CallcenterError, CallcenterResult},
    intent::Intent,
};

/// The intent chosen when no keyword matches.
pub const DEFAULT_INTENT: Intent = Intent::BillingIssue;

/// One `[[intents]]` entry in the TOML keyword file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Canonical intent label, e.g. `"SIM Not Working"`.
    pub intent: Intent,
    pub keywords: Vec<String>,
}

/// The top-level structure deserialized from a TOML keyword file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordConfig {
    #[serde(default)]
    pub intents: Vec<KeywordRule>,
}

/// Keyword lists for every canonical intent, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordTable {
    entries: Vec<(Intent, Vec<String>)>,
}

impl KeywordTable {
    /// Build a table from a parsed config.
    ///
    /// Keywords are trimmed and lower-cased; blanks are dropped. Several
    /// entries for the same intent are merged. Intents the config does not
    /// mention get an empty list and can only win as `DEFAULT_INTENT`.
    pub fn from_config(config: KeywordConfig) -> Self {
        let mut entries: Vec<(Intent, Vec<String>)> =
            Intent::ALL.iter().map(|intent| (*intent, Vec::new())).collect();

        for rule in config.intents {
            if let Some((_, keywords)) = entries.iter_mut().find(|(i, _)| *i == rule.intent) {
                keywords.extend(
                    rule.keywords
                        .iter()
                        .map(|k| k.trim().to_lowercase())
                        .filter(|k| !k.is_empty()),
                );
            }
        }

        Self { entries }
    }

    /// Parse `s` as a TOML keyword file.
    ///
    /// Returns `CallcenterError::ConfigError` if the TOML is malformed or
    /// names an intent outside the canonical set.
    pub fn from_toml_str(s: &str) -> CallcenterResult<Self> {
        let config: KeywordConfig = toml::from_str(s).map_err(|e| CallcenterError::ConfigError {
            reason: format!("failed to parse keyword TOML: {}", e),
        })?;
        Ok(Self::from_config(config))
    }

    /// Read and parse the keyword file at `path`.
    pub fn from_file(path: &Path) -> CallcenterResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| CallcenterError::ConfigError {
            reason: format!("failed to read keyword file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// The keywords registered for `intent`.
    pub fn keywords(&self, intent: Intent) -> &[String] {
        self.entries
            .iter()
            .find(|(i, _)| *i == intent)
            .map(|(_, keywords)| keywords.as_slice())
            .unwrap_or(&[])
    }

    /// Score every intent against `text`, in enumeration order.
    pub fn scores(&self, text: &str) -> Vec<(Intent, usize)> {
        let text = text.to_lowercase();
        self.entries
            .iter()
            .map(|(intent, keywords)| {
                let score = keywords.iter().map(|k| count_word_starts(&text, k)).sum();
                (*intent, score)
            })
            .collect()
    }

    /// Pick the best-scoring intent for `text`.
    ///
    /// Deterministic: the same text always yields the same intent.
    pub fn classify(&self, text: &str) -> Intent {
        let mut best: Option<(Intent, usize)> = None;
        for (intent, score) in self.scores(text) {
            if score > 0 && best.map_or(true, |(_, top)| score > top) {
                best = Some((intent, score));
            }
        }

        let intent = best.map(|(intent, _)| intent).unwrap_or(DEFAULT_INTENT);
        debug!(
            intent = %intent,
            score = best.map(|(_, s)| s).unwrap_or(0),
            "keyword fallback decided intent"
        );
        intent
    }
}

impl Default for KeywordTable {
    /// The built-in telecom keyword lists.
    fn default() -> Self {
        let rule = |intent: Intent, keywords: &[&str]| KeywordRule {
            intent,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        };

        Self::from_config(KeywordConfig {
            intents: vec![
                rule(
                    Intent::BillingIssue,
                    &["bill", "charge", "overcharge", "invoice", "payment", "refund", "deduct", "postpaid"],
                ),
                rule(
                    Intent::SimNotWorking,
                    &["sim", "esim", "no service", "not registered", "emergency calls only"],
                ),
                rule(
                    Intent::NoNetworkCoverage,
                    &["no network", "coverage", "signal", "no signal", "tower", "out of range", "no bars"],
                ),
                rule(
                    Intent::InternetSpeedSlow,
                    &["slow", "speed", "buffering", "lag", "mbps", "loading"],
                ),
                rule(
                    Intent::DataNotWorkingAfterRecharge,
                    &["recharge", "top up", "topup", "top-up", "data", "pack"],
                ),
                rule(
                    Intent::CallDropsFrequently,
                    &["drop", "call drop", "disconnect", "call cut", "calls cut", "cut off", "mid call"],
                ),
            ],
        })
    }
}

/// Count occurrences of `keyword` in `text` that begin at a word start.
fn count_word_starts(text: &str, keyword: &str) -> usize {
    if keyword.is_empty() {
        return 0;
    }
    text.match_indices(keyword)
        .filter(|(idx, _)| {
            text[..*idx]
                .chars()
                .next_back()
                .map_or(true, |prev| !prev.is_alphanumeric())
        })
        .count()
}
