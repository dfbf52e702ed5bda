//! Turn record and call log types.
//!
//! `TurnRecord` wraps the JSON-safe final state of one turn with a sequence
//! number and the SHA-256 hashes linking it to the turn before. `CallLog` is
//! what gets persisted per call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One persisted turn in a call's hash chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Position in the call, starting at 0.
    pub sequence: u64,

    pub call_id: String,

    /// The final `CallState` of the turn, as produced by `json_safe`.
    pub state: Value,

    pub recorded_at: DateTime<Utc>,

    /// `this_hash` of the previous turn, or `GENESIS_HASH` for turn 0.
    pub prev_hash: String,

    /// SHA-256 (hex) over call_id, sequence, prev_hash and the canonical
    /// JSON of `state`. See `chain::hash_turn`.
    pub this_hash: String,
}

impl TurnRecord {
    /// `prev_hash` of the first turn of every call.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// Every recorded turn of one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallLog {
    pub call_id: String,

    /// Turns in chain order.
    pub turns: Vec<TurnRecord>,

    pub updated_at: DateTime<Utc>,

    /// `this_hash` of the last turn; empty when there are no turns.
    pub terminal_hash: String,
}

impl CallLog {
    pub fn from_turns(call_id: impl Into<String>, turns: Vec<TurnRecord>) -> Self {
        let terminal_hash = turns
            .last()
            .map(|t| t.this_hash.clone())
            .unwrap_or_default();
        Self {
            call_id: call_id.into(),
            turns,
            updated_at: Utc::now(),
            terminal_hash,
        }
    }

    /// The state recorded by the most recent turn.
    pub fn latest_state(&self) -> Option<&Value> {
        self.turns.last().map(|t| &t.state)
    }
}
