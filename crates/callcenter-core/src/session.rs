//! Call-session driver.
//!
//! A `CallSession` owns the transcript of one call across turns. Each turn it
//! builds a fresh `CallState`, runs it through the graph, records the agent's
//! reply, and hands the final state to the call-log collaborator. The graph
//! itself stays stateless between turns.

use tracing::{info, warn};

use callcenter_contracts::{
    error::{CallcenterError, CallcenterResult},
    script::{extract_script_text, ScriptPayload},
    state::{new_call_id, CallState, TranscriptEntry},
};

use crate::{graph::CallGraph, traits::CallLogWriter};

/// One phone call: an id, its transcript, and whether it is still live.
#[derive(Debug, Clone)]
pub struct CallSession {
    call_id: String,
    transcript: Vec<TranscriptEntry>,
    active: bool,
    last_state: Option<CallState>,
}

impl CallSession {
    pub const CALL_ID_PREFIX: &'static str = "C";
    pub const END_OF_CALL_NOTICE: &'static str = "Call ended by user.";

    /// Start a new call with a freshly generated id and empty transcript.
    pub fn start() -> Self {
        Self::resume(new_call_id(Self::CALL_ID_PREFIX), Vec::new())
    }

    /// Continue a live call from an existing id and transcript.
    pub fn resume(call_id: impl Into<String>, transcript: Vec<TranscriptEntry>) -> Self {
        Self {
            call_id: call_id.into(),
            transcript,
            active: true,
            last_state: None,
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The final state of the most recent turn, if any turn has run.
    pub fn last_state(&self) -> Option<&CallState> {
        self.last_state.as_ref()
    }

    /// Run one turn for `utterance`.
    ///
    /// `graph` is `None` when the graph could not be built (for example the
    /// language-model backend is misconfigured); the turn then completes
    /// with the system-error script instead of failing.
    ///
    /// The returned state has `script` reduced to its display text and its
    /// transcript includes the agent's reply. A failed log write is logged
    /// and otherwise ignored.
    ///
    /// # Errors
    ///
    /// `SessionClosed` after `end()`, and `EmptyUtterance` when transcription
    /// produced only whitespace. No graph stage runs in either case.
    pub fn take_turn(
        &mut self,
        graph: Option<&CallGraph>,
        utterance: &str,
        log: &dyn CallLogWriter,
    ) -> CallcenterResult<CallState> {
        if !self.active {
            return Err(CallcenterError::SessionClosed {
                call_id: self.call_id.clone(),
            });
        }
        if utterance.trim().is_empty() {
            return Err(CallcenterError::EmptyUtterance);
        }

        self.transcript.push(TranscriptEntry::user(utterance));
        let initial = CallState::new(self.call_id.clone(), self.transcript.clone());

        let mut state = match graph {
            Some(graph) => graph.invoke(initial),
            None => {
                warn!(call_id = %self.call_id, "call graph unavailable; substituting system-error script");
                initial.into_system_error()
            }
        };

        let reply = extract_script_text(Some(&state.script));
        state.script = ScriptPayload::Text(reply.clone());
        if !reply.is_empty() {
            self.transcript.push(TranscriptEntry::agent(reply));
        }
        state.transcript = self.transcript.clone();

        if let Err(e) = log.write(&state) {
            warn!(call_id = %self.call_id, error = %e, "failed to persist call log; continuing");
        }

        info!(
            call_id = %self.call_id,
            intent = %state.intent,
            confidence = state.confidence,
            turns = self.transcript.len(),
            "session turn complete"
        );

        self.last_state = Some(state.clone());
        Ok(state)
    }

    /// End the call. Later turns are rejected with `SessionClosed`.
    ///
    /// Ending an already-ended call does nothing.
    pub fn end(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.transcript.push(TranscriptEntry::system(Self::END_OF_CALL_NOTICE));
        info!(call_id = %self.call_id, "call ended");
    }
}
