//! Handler script payloads and the display-text extraction contract.
//!
//! A handler stores whatever the generative capability returned. That may
//! be plain text, a chat message with a `content` field, or some other JSON
//! document. Presentation code never inspects the variants directly; it calls
//! `extract_script_text`, which is total and idempotent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::intent::ActionLabel;

/// A chat-style message returned by a generative backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedMessage {
    pub content: String,
    #[serde(default)]
    pub role: String,
    /// Backend-specific extras (model id, finish reason, usage).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl GeneratedMessage {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: "assistant".to_string(),
            metadata: Map::new(),
        }
    }
}

/// The raw output of a response handler, stored in `CallState::script`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptPayload {
    Text(String),
    Message(GeneratedMessage),
    Structured(Value),
}

impl Default for ScriptPayload {
    fn default() -> Self {
        ScriptPayload::Text(String::new())
    }
}

impl From<&str> for ScriptPayload {
    fn from(text: &str) -> Self {
        ScriptPayload::Text(text.to_string())
    }
}

impl From<String> for ScriptPayload {
    fn from(text: String) -> Self {
        ScriptPayload::Text(text)
    }
}

impl ScriptPayload {
    /// Keys probed, in order, when the payload is an arbitrary JSON object.
    pub const TEXT_KEYS: [&'static str; 3] = ["content", "text", "message"];

    /// The human-readable text of this payload.
    pub fn display_text(&self) -> String {
        match self {
            ScriptPayload::Text(text) => text.clone(),
            ScriptPayload::Message(message) => message.content.clone(),
            ScriptPayload::Structured(value) => value_text(value),
        }
    }

    /// Return true if the payload carries no displayable text.
    pub fn is_empty(&self) -> bool {
        self.display_text().trim().is_empty()
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(map) => ScriptPayload::TEXT_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

/// Produce a single display string from a handler's script payload.
///
/// - `None` → empty string
/// - plain text → the text
/// - message → its `content`
/// - JSON object → the first string under `content`, `text`, or `message`
/// - anything else → its JSON rendering
///
/// Never fails. Feeding the result back in as text returns it unchanged.
pub fn extract_script_text(payload: Option<&ScriptPayload>) -> String {
    payload.map(ScriptPayload::display_text).unwrap_or_default()
}

// ── ScriptParts ───────────────────────────────────────────────────────────────

/// The three semantic parts of a generated handler script.
///
/// Handlers do not parse their own output; this is a presentation-side helper
/// for callers that want the customer line separately from the internal
/// fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptParts {
    pub customer_message: String,
    /// The action label as written by the model.
    pub action_label: String,
    pub internal_note: String,
}

impl ScriptParts {
    /// Split generated text into its three parts.
    ///
    /// Blank lines are skipped and list markers (`1)`, `2.`, `-`, `*`) and
    /// field prefixes such as `Action:` are stripped. Lines beyond the third
    /// are folded into the internal note. Returns `None` when fewer than
    /// three non-blank lines are present.
    pub fn parse(text: &str) -> Option<Self> {
        let lines: Vec<String> = text
            .lines()
            .map(strip_marker)
            .filter(|line| !line.is_empty())
            .collect();

        if lines.len() < 3 {
            return None;
        }

        Some(Self {
            customer_message: lines[0].clone(),
            action_label: lines[1].clone(),
            internal_note: lines[2..].join(" "),
        })
    }

    /// The action label, if it names a known `ActionLabel`.
    pub fn action(&self) -> Option<ActionLabel> {
        self.action_label.parse().ok()
    }
}

fn strip_marker(line: &str) -> String {
    let mut rest = line.trim();

    // Ordinal markers: "1)", "2.", "3 -"
    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let after = rest[digits..].trim_start();
        if let Some(stripped) = after
            .strip_prefix(')')
            .or_else(|| after.strip_prefix('.'))
            .or_else(|| after.strip_prefix('-'))
        {
            rest = stripped.trim_start();
        }
    }

    // Bullet markers.
    if let Some(stripped) = rest.strip_prefix("- ").or_else(|| rest.strip_prefix("* ")) {
        rest = stripped.trim_start();
    }

    // Field prefixes: "Action: open-ticket", "Internal note: ...".
    if let Some((head, tail)) = rest.split_once(':') {
        let head = head.trim().to_ascii_lowercase();
        let is_field = matches!(
            head.as_str(),
            "customer" | "customer message" | "message" | "action" | "action label"
                | "internal action" | "internal action label" | "note" | "internal note"
        );
        if is_field {
            rest = tail.trim_start();
        }
    }

    rest.trim().to_string()
}
