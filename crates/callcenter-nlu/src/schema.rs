//! JSON Schema for the classifier's structured output.
//!
//! The same document is handed to the structured-output capability as the
//! shape to produce, and is then used to validate what came back. Only
//! `intent` is required: a missing `confidence` decodes as `0.0` (and is
//! clamped later), missing `entities` as an empty map. Entity values are
//! not typed here: non-scalar values are dropped during normalization
//! rather than voiding the classification.

use serde_json::{json, Value};
use tracing::warn;

use callcenter_contracts::intent::Intent;

/// The NLU output schema, with `intent` restricted to the canonical labels.
pub fn nlu_output_schema() -> Value {
    let labels: Vec<&str> = Intent::ALL.iter().map(|i| i.label()).collect();
    json!({
        "title": "NluOutput",
        "type": "object",
        "required": ["intent"],
        "properties": {
            "intent": { "type": "string", "enum": labels },
            "confidence": { "type": "number" },
            "entities": { "type": "object" },
            "notes": { "type": ["string", "null"] }
        }
    })
}

/// Validate `instance` against `schema`.
///
/// Returns every violation, formatted with its instance path. An invalid
/// schema document is reported as a single failure.
pub fn validate(schema: &Value, instance: &Value) -> Result<(), Vec<String>> {
    let validator = match jsonschema::validator_for(schema) {
        Ok(validator) => validator,
        Err(e) => {
            warn!(error = %e, "NLU schema failed to compile");
            return Err(vec![format!("invalid JSON Schema document: {e}")]);
        }
    };

    let failures: Vec<String> = validator
        .iter_errors(instance)
        .map(|error| format!("at '{}': {}", error.instance_path, error))
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}
