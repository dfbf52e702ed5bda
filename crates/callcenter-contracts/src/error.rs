//! Runtime error types for the call-turn pipeline.
//!
//! Every fallible operation outside the classifier returns
//! `CallcenterResult<T>`. The classifier has its own `ClassificationError`
//! (see `nlu`) because its failures never leave the classifier component.

use thiserror::Error;

/// The unified error type for the call-center runtime.
#[derive(Debug, Error)]
pub enum CallcenterError {
    /// The generative text capability failed to produce a response.
    #[error("text generation failed: {reason}")]
    Generation { reason: String },

    /// The call graph could not be assembled (missing stage, backend
    /// unreachable or misconfigured).
    #[error("call graph construction failed: {reason}")]
    GraphConstruction { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The call log collaborator could not persist a turn.
    #[error("call log write failed: {reason}")]
    LogWriteFailed { reason: String },

    /// A value could not be converted to or from its wire form.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// A string did not name a member of a closed label set.
    #[error("'{label}' is not a recognised {kind} label")]
    InvalidLabel { kind: &'static str, label: String },

    /// A turn was requested on a call that has already ended.
    #[error("call '{call_id}' has ended; no further turns are accepted")]
    SessionClosed { call_id: String },

    /// Transcription produced no usable text for the turn.
    #[error("utterance is empty; nothing to process")]
    EmptyUtterance,
}

/// Convenience alias used throughout the call-center crates.
pub type CallcenterResult<T> = Result<T, CallcenterError>;
