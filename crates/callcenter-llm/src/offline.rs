//! Offline backend for simulation and demos.
//!
//! `OfflineGenerator` has no structured-output capability, so every
//! classification goes through the keyword fallback. Free-text calls return
//! a fixed acknowledgement in the handler's three-line format, with the
//! action label taken from the labels the handler prompt offers.

use serde_json::Value;

use callcenter_contracts::{
    error::{CallcenterError, CallcenterResult},
    script::{GeneratedMessage, ScriptPayload},
};
use callcenter_core::traits::TextGenerator;

pub const OFFLINE_CUSTOMER_LINE: &str =
    "We have logged your complaint and an agent will follow up within 24 hours.";
pub const OFFLINE_NOTE: &str =
    "offline backend: scripted acknowledgement, no language model consulted";
/// Used when the prompt offers no action labels.
pub const OFFLINE_DEFAULT_ACTION: &str = "no-action";

/// The first label of the prompt's `exactly one of [...]` list.
fn first_offered_action(prompt: &str) -> Option<&str> {
    let (_, rest) = prompt.split_once("exactly one of [")?;
    let (list, _) = rest.split_once(']')?;
    list.split(',')
        .map(|label| label.trim().trim_matches('"').trim())
        .find(|label| !label.is_empty())
}

/// The offline reply to `prompt`.
pub fn offline_script(prompt: &str) -> String {
    let action = first_offered_action(prompt).unwrap_or(OFFLINE_DEFAULT_ACTION);
    format!("{OFFLINE_CUSTOMER_LINE}\n{action}\n{OFFLINE_NOTE}")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

impl TextGenerator for OfflineGenerator {
    fn invoke(&self, prompt: &str) -> CallcenterResult<ScriptPayload> {
        let mut message = GeneratedMessage::assistant(offline_script(prompt));
        message
            .metadata
            .insert("model".to_string(), Value::String("offline".to_string()));
        Ok(ScriptPayload::Message(message))
    }

    fn invoke_structured(&self, _prompt: &str, _schema: &Value) -> CallcenterResult<Value> {
        Err(CallcenterError::Generation {
            reason: "structured output is unavailable in offline mode".to_string(),
        })
    }
}
