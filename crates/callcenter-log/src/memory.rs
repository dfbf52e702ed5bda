//! In-memory implementation of `CallLogWriter`.
//!
//! Keeps one hash chain per call id behind an `Arc<Mutex<_>>`. Used by the
//! tests and by the CLI when persistence is disabled.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use callcenter_contracts::{
    error::{CallcenterError, CallcenterResult},
    state::CallState,
};
use callcenter_core::traits::CallLogWriter;

use crate::{
    chain::{next_turn, verify_chain},
    event::{CallLog, TurnRecord},
    safe::json_safe,
};

#[derive(Debug, Clone, Default)]
pub struct InMemoryCallLogWriter {
    pub(crate) calls: Arc<Mutex<BTreeMap<String, Vec<TurnRecord>>>>,
}

impl InMemoryCallLogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of every call written so far, sorted.
    pub fn call_ids(&self) -> Vec<String> {
        match self.calls.lock() {
            Ok(calls) => calls.keys().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// The log for `call_id`, if any turn has been written for it.
    pub fn export_log(&self, call_id: &str) -> Option<CallLog> {
        let calls = self.calls.lock().ok()?;
        calls
            .get(call_id)
            .map(|turns| CallLog::from_turns(call_id, turns.clone()))
    }

    /// Whether the chain for `call_id` is intact. Unknown calls are intact.
    pub fn verify_integrity(&self, call_id: &str) -> bool {
        match self.calls.lock() {
            Ok(calls) => calls.get(call_id).map_or(true, |turns| verify_chain(turns)),
            Err(_) => false,
        }
    }
}

impl CallLogWriter for InMemoryCallLogWriter {
    fn write(&self, state: &CallState) -> CallcenterResult<()> {
        let snapshot = json_safe(state)?;
        let mut calls = self.calls.lock().map_err(|e| CallcenterError::LogWriteFailed {
            reason: format!("call log lock poisoned: {}", e),
        })?;

        let turns = calls.entry(state.call_id.clone()).or_default();
        let record = next_turn(turns, &state.call_id, snapshot)?;
        debug!(call_id = %state.call_id, sequence = record.sequence, "turn recorded in memory");
        turns.push(record);
        Ok(())
    }
}
