//! Hash-chain primitives for call logs.
//!
//! Hash input layout (bytes, in order):
//!   1. call_id as UTF-8 bytes
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. compact JSON of the recorded state

use chrono::Utc;
use serde_json::Value;
use sha2::{Digest, Sha256};

use callcenter_contracts::error::{CallcenterError, CallcenterResult};

use crate::event::{CallLog, TurnRecord};

/// Lowercase hex SHA-256 of one turn.
pub fn hash_turn(
    call_id: &str,
    sequence: u64,
    state: &Value,
    prev_hash: &str,
) -> CallcenterResult<String> {
    let state_json = serde_json::to_vec(state).map_err(|e| CallcenterError::Serialization {
        reason: format!("failed to encode turn state: {e}"),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(call_id.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&state_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Build the record that follows `turns` for `state`.
pub fn next_turn(turns: &[TurnRecord], call_id: &str, state: Value) -> CallcenterResult<TurnRecord> {
    let (sequence, prev_hash) = match turns.last() {
        Some(last) => (last.sequence + 1, last.this_hash.clone()),
        None => (0, TurnRecord::GENESIS_HASH.to_string()),
    };
    let this_hash = hash_turn(call_id, sequence, &state, &prev_hash)?;

    Ok(TurnRecord {
        sequence,
        call_id: call_id.to_string(),
        state,
        recorded_at: Utc::now(),
        prev_hash,
        this_hash,
    })
}

/// Check linkage, hash correctness and sequence numbering of `turns`.
///
/// An empty chain is valid.
pub fn verify_chain(turns: &[TurnRecord]) -> bool {
    let mut expected_prev = TurnRecord::GENESIS_HASH.to_string();

    for (idx, turn) in turns.iter().enumerate() {
        if turn.sequence != idx as u64 || turn.prev_hash != expected_prev {
            return false;
        }
        match hash_turn(&turn.call_id, turn.sequence, &turn.state, &turn.prev_hash) {
            Ok(recomputed) if recomputed == turn.this_hash => {}
            _ => return false,
        }
        expected_prev = turn.this_hash.clone();
    }

    true
}

/// `verify_chain` plus the log-level invariants: every turn belongs to the
/// log's call and `terminal_hash` matches the last turn.
pub fn verify_log(log: &CallLog) -> bool {
    let terminal = log.turns.last().map(|t| t.this_hash.as_str()).unwrap_or("");
    log.turns.iter().all(|t| t.call_id == log.call_id)
        && log.terminal_hash == terminal
        && verify_chain(&log.turns)
}
