//! JSON-file implementation of `CallLogWriter`.
//!
//! One pretty-printed `CallLog` per call at `<dir>/<call_id>.json`. Each
//! write loads the existing log, appends the new turn and replaces the file
//! through a sibling temp file and a rename, so a crash mid-write leaves the
//! previous version intact.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use callcenter_contracts::{
    error::{CallcenterError, CallcenterResult},
    state::CallState,
};
use callcenter_core::traits::CallLogWriter;

use crate::{chain::next_turn, event::CallLog, safe::json_safe};

#[derive(Debug)]
pub struct FileCallLogWriter {
    dir: PathBuf,
    // Serializes read-modify-write cycles within this process.
    guard: Mutex<()>,
}

impl FileCallLogWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the log for `call_id` lives.
    ///
    /// Rejects ids that could escape the log directory.
    pub fn path_for(&self, call_id: &str) -> CallcenterResult<PathBuf> {
        let unsafe_id = call_id.is_empty()
            || call_id.contains(|c: char| c == '/' || c == '\\')
            || call_id.contains("..");
        if unsafe_id {
            return Err(CallcenterError::LogWriteFailed {
                reason: format!("call id '{call_id}' is not usable as a file name"),
            });
        }
        Ok(self.dir.join(format!("{call_id}.json")))
    }

    /// Load the log for `call_id`. `Ok(None)` when the call has no file.
    pub fn load(&self, call_id: &str) -> CallcenterResult<Option<CallLog>> {
        let path = self.path_for(call_id)?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path).map_err(|e| CallcenterError::LogWriteFailed {
            reason: format!("failed to read '{}': {e}", path.display()),
        })?;
        let log = serde_json::from_str(&contents).map_err(|e| CallcenterError::Serialization {
            reason: format!("'{}' is not a call log: {e}", path.display()),
        })?;
        Ok(Some(log))
    }

    /// Ids of every call with a log file, sorted. A missing directory
    /// means no calls.
    pub fn list(&self) -> CallcenterResult<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|e| CallcenterError::LogWriteFailed {
            reason: format!("failed to list '{}': {e}", self.dir.display()),
        })?;

        let mut ids: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    return None;
                }
                path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
            })
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn persist(&self, path: &Path, log: &CallLog) -> CallcenterResult<()> {
        let body = serde_json::to_string_pretty(log).map_err(|e| CallcenterError::Serialization {
            reason: format!("failed to encode call log: {e}"),
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|e| CallcenterError::LogWriteFailed {
            reason: format!("failed to write '{}': {e}", tmp.display()),
        })?;
        fs::rename(&tmp, path).map_err(|e| CallcenterError::LogWriteFailed {
            reason: format!("failed to replace '{}': {e}", path.display()),
        })
    }
}

impl CallLogWriter for FileCallLogWriter {
    fn write(&self, state: &CallState) -> CallcenterResult<()> {
        let _guard = self.guard.lock().map_err(|e| CallcenterError::LogWriteFailed {
            reason: format!("call log lock poisoned: {e}"),
        })?;

        let path = self.path_for(&state.call_id)?;
        fs::create_dir_all(&self.dir).map_err(|e| CallcenterError::LogWriteFailed {
            reason: format!("failed to create '{}': {e}", self.dir.display()),
        })?;

        let mut turns = match self.load(&state.call_id)? {
            Some(log) => log.turns,
            None => Vec::new(),
        };
        let record = next_turn(&turns, &state.call_id, json_safe(state)?)?;
        let sequence = record.sequence;
        turns.push(record);

        let log = CallLog::from_turns(state.call_id.clone(), turns);
        self.persist(&path, &log)?;

        debug!(path = %path.display(), sequence, "call log file updated");
        if sequence == 0 {
            info!(call_id = %state.call_id, path = %path.display(), "call log created");
        }
        Ok(())
    }
}
