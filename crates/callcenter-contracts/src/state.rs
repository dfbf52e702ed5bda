//! Call-state types.
//!
//! A `CallState` is created at the start of a call turn, owned exclusively by
//! the call graph while the turn runs, and handed back to the caller at the
//! end. It is never shared between concurrent turns.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{intent::IntentLabel, script::ScriptPayload};

/// The customer-facing script substituted when a turn cannot be completed.
pub const SYSTEM_ERROR_SCRIPT: &str = "(System error) Unable to process request.";

/// Generate a fresh call-session identifier.
///
/// Format: `<prefix>-<8 upper-case hex chars>-<yymmddHHMMSS>`, e.g.
/// `C-1A2B3C4D-261016143005`. The hex part comes from a v4 UUID.
pub fn new_call_id(prefix: &str) -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        prefix,
        uuid[..8].to_ascii_uppercase(),
        Utc::now().format("%y%m%d%H%M%S")
    )
}

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Agent,
    System,
}

/// One utterance in a call transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub text: String,
    /// Wall-clock time (UTC) the entry was appended.
    pub timestamp: DateTime<Utc>,
    pub speaker: Speaker,
}

impl TranscriptEntry {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
            speaker,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text)
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Speaker::Agent, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Speaker::System, text)
    }
}

/// What the voice layer should do once the turn's script is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    PlayTts,
    EscalateSim,
    #[default]
    EndCall,
    FollowUp,
}

impl NextAction {
    pub fn as_str(self) -> &'static str {
        match self {
            NextAction::PlayTts => "play_tts",
            NextAction::EscalateSim => "escalate_sim",
            NextAction::EndCall => "end_call",
            NextAction::FollowUp => "follow_up",
        }
    }
}

/// The record passed through every stage of one call turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallState {
    /// Opaque call-session identifier, stable across turns of one call.
    pub call_id: String,
    /// Append-only transcript. The graph only reads the last entry.
    pub transcript: Vec<TranscriptEntry>,
    /// Trimmed, lower-cased text of the latest utterance.
    pub clean_text: String,
    pub intent: IntentLabel,
    /// In `[0.01, 1.0]` after classification; `0.0` before it runs and on
    /// the system-error path.
    pub confidence: f64,
    /// Extracted facts. Absence of a key means the entity was not mentioned.
    pub entities: BTreeMap<String, String>,
    pub script: ScriptPayload,
    pub next_action: NextAction,
    /// Simulated transcription result, consumed at turn start when present.
    #[serde(default)]
    pub test_input: Option<String>,
}

impl CallState {
    /// Build the initial state for a turn over `transcript`.
    pub fn new(call_id: impl Into<String>, transcript: Vec<TranscriptEntry>) -> Self {
        Self {
            call_id: call_id.into(),
            transcript,
            clean_text: String::new(),
            intent: IntentLabel::Unknown,
            confidence: 0.0,
            entities: BTreeMap::new(),
            script: ScriptPayload::default(),
            next_action: NextAction::EndCall,
            test_input: None,
        }
    }

    /// Attach a simulated transcription result to be consumed at turn start.
    pub fn with_test_input(mut self, text: impl Into<String>) -> Self {
        self.test_input = Some(text.into());
        self
    }

    /// The most recent transcript entry, if any.
    pub fn last_entry(&self) -> Option<&TranscriptEntry> {
        self.transcript.last()
    }

    /// Replace the turn's outcome with the fixed system-error script.
    ///
    /// Used whenever generation or graph construction fails, so the caller
    /// always receives a usable state.
    pub fn into_system_error(mut self) -> Self {
        self.script = ScriptPayload::Text(SYSTEM_ERROR_SCRIPT.to_string());
        self.intent = IntentLabel::SystemError;
        self.confidence = 0.0;
        self
    }

    /// Return true if this state carries the system-error outcome.
    pub fn is_system_error(&self) -> bool {
        self.intent == IntentLabel::SystemError
    }
}
