//! Capability traits for the call-turn pipeline.
//!
//! These four traits are the seams of the runtime:
//!
//! - `TextGenerator`: external language-model backend (untrusted, slow)
//! - `IntentClassifier`: turns cleaned text into a validated `NluOutput`
//! - `ResponseHandler`: produces the scripted response for one intent
//! - `CallLogWriter`: persists the final state of a turn
//!
//! The call graph owns one classifier and six handlers and drives them in a
//! fixed order. Implementations are constructed once at startup and must be
//! safe to share across turns.

use std::collections::BTreeMap;

use callcenter_contracts::{
    error::CallcenterResult,
    nlu::NluOutput,
    script::ScriptPayload,
    state::{CallState, NextAction},
};

/// A generative text capability, typically backed by a hosted language model.
///
/// Both calls are blocking and potentially slow. Implementations own any
/// timeout and retry policy; the graph never retries.
pub trait TextGenerator: Send + Sync {
    /// Generate free text for `prompt`.
    fn invoke(&self, prompt: &str) -> CallcenterResult<ScriptPayload>;

    /// Generate a JSON document for `prompt` that is meant to satisfy
    /// `schema` (a JSON Schema document).
    ///
    /// Implementations are not required to validate the result; callers must
    /// treat the returned value as untrusted.
    fn invoke_structured(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> CallcenterResult<serde_json::Value>;
}

/// Classifies a cleaned utterance into one of the canonical intents.
///
/// This call cannot fail. Implementations must absorb every backend failure
/// and return a deterministic fallback result instead, with `confidence`
/// inside `[0.01, 1.0]`.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, clean_text: &str) -> NluOutput;
}

/// What a response handler hands back to the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerOutput {
    /// The raw generated payload. Handlers do not parse or validate it.
    pub script: ScriptPayload,
    pub next_action: NextAction,
}

/// Produces the scripted response for one canonical intent.
pub trait ResponseHandler: Send + Sync {
    /// Generate the response for `clean_text` given the extracted `entities`.
    ///
    /// An `Err` is absorbed by the graph, which substitutes the system-error
    /// script for the turn.
    fn handle(
        &self,
        clean_text: &str,
        entities: &BTreeMap<String, String>,
    ) -> CallcenterResult<HandlerOutput>;
}

/// Persists the final state of a call turn.
///
/// Persistence is a side effect outside the turn: callers log a failed
/// write and carry on.
pub trait CallLogWriter: Send + Sync {
    fn write(&self, state: &CallState) -> CallcenterResult<()>;
}
