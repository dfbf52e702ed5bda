//! Intent-classification output contract.
//!
//! `NluOutput` is transient: the classifier produces it and the call graph
//! copies its fields into `CallState`. Its `intent` is an `Intent`, so the
//! closed-set invariant holds by construction once a value exists.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::intent::Intent;

/// Lowest confidence a classified turn may report.
///
/// A classified turn never shows `0.0`, which is reserved for
/// "not classified yet" and the system-error path.
pub const CONFIDENCE_FLOOR: f64 = 0.01;

/// Confidence assigned when the keyword fallback decided the intent.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Clamp a reported confidence into `[CONFIDENCE_FLOOR, 1.0]`.
///
/// NaN clamps to the floor.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return CONFIDENCE_FLOOR;
    }
    value.clamp(CONFIDENCE_FLOOR, 1.0)
}

/// The validated result of classifying one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NluOutput {
    pub intent: Intent,
    pub confidence: f64,
    #[serde(default)]
    pub entities: BTreeMap<String, String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NluOutput {
    /// Build an output with a clamped confidence and no entities.
    pub fn new(intent: Intent, confidence: f64) -> Self {
        Self {
            intent,
            confidence: clamp_confidence(confidence),
            entities: BTreeMap::new(),
            notes: None,
        }
    }
}

/// Why the language-model classification path could not be used.
///
/// None of these escape the classifier: each one routes to the keyword
/// fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassificationError {
    /// The structured-output capability raised.
    #[error("classification capability failed: {reason}")]
    Capability { reason: String },

    /// The capability answered with a label outside the canonical set.
    #[error("classifier returned out-of-domain intent '{label}'")]
    InvalidIntent { label: String },

    /// The response did not satisfy the NLU output schema.
    #[error("classifier output violates schema: {}", failures.join("; "))]
    SchemaViolation { failures: Vec<String> },

    /// The response passed the schema but could not be decoded.
    #[error("classifier output is malformed: {reason}")]
    Malformed { reason: String },
}
