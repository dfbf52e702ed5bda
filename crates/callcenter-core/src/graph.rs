//! The call graph: the fixed single-entry, single-exit turn runner.
//!
//! Topology:
//!
//!   Start → Preprocess → Classify → Route → {one of six handlers} → End
//!
//! Every transition is unconditional except Classified → Handled, which is a
//! six-way branch chosen by `router::route`. Exactly one handler runs per
//! turn, and no stage is ever revisited. The graph is built once and shared
//! across turns; the per-turn `CallState` is moved through it by value.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use callcenter_contracts::{
    error::{CallcenterError, CallcenterResult},
    intent::{HandlerName, IntentLabel},
    nlu::clamp_confidence,
    state::{CallState, TranscriptEntry},
};

use crate::{
    preprocess::preprocess,
    router::route,
    traits::{IntentClassifier, ResponseHandler},
};

/// Positions in the turn state machine, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    Preprocessed,
    Classified,
    Handled,
    End,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Preprocessed => "preprocessed",
            Stage::Classified => "classified",
            Stage::Handled => "handled",
            Stage::End => "end",
        };
        f.write_str(name)
    }
}

/// The outcome of one call turn.
///
/// Both variants carry a complete, usable `CallState`; nothing inside the
/// graph propagates a failure past the turn boundary.
#[derive(Debug)]
pub enum TurnResult {
    /// The routed handler produced a script.
    Handled {
        state: CallState,
        handler: HandlerName,
    },

    /// The routed handler failed; `state` carries the system-error script.
    Degraded {
        state: CallState,
        handler: HandlerName,
        reason: String,
    },
}

impl TurnResult {
    pub fn state(&self) -> &CallState {
        match self {
            TurnResult::Handled { state, .. } | TurnResult::Degraded { state, .. } => state,
        }
    }

    pub fn into_state(self) -> CallState {
        match self {
            TurnResult::Handled { state, .. } | TurnResult::Degraded { state, .. } => state,
        }
    }

    /// The handler the router chose for this turn.
    pub fn handler(&self) -> HandlerName {
        match self {
            TurnResult::Handled { handler, .. } | TurnResult::Degraded { handler, .. } => *handler,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, TurnResult::Degraded { .. })
    }
}

/// Assembles a `CallGraph`.
///
/// `build()` fails unless a classifier and all six handlers were supplied.
#[derive(Default)]
pub struct CallGraphBuilder {
    classifier: Option<Box<dyn IntentClassifier>>,
    handlers: BTreeMap<HandlerName, Box<dyn ResponseHandler>>,
}

impl CallGraphBuilder {
    pub fn classifier(mut self, classifier: Box<dyn IntentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Register the handler for `name`. Registering a name twice replaces
    /// the earlier handler.
    pub fn handler(mut self, name: HandlerName, handler: Box<dyn ResponseHandler>) -> Self {
        self.handlers.insert(name, handler);
        self
    }

    pub fn build(self) -> CallcenterResult<CallGraph> {
        let classifier = self.classifier.ok_or_else(|| CallcenterError::GraphConstruction {
            reason: "no intent classifier registered".to_string(),
        })?;

        let missing: Vec<&str> = HandlerName::ALL
            .iter()
            .filter(|name| !self.handlers.contains_key(*name))
            .map(|name| name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(CallcenterError::GraphConstruction {
                reason: format!("missing handlers: {}", missing.join(", ")),
            });
        }

        Ok(CallGraph {
            classifier,
            handlers: self.handlers,
        })
    }
}

/// The compiled call-turn graph.
///
/// Immutable after construction and `Send + Sync`, so one instance can serve
/// every turn of every call.
pub struct CallGraph {
    classifier: Box<dyn IntentClassifier>,
    handlers: BTreeMap<HandlerName, Box<dyn ResponseHandler>>,
}

impl CallGraph {
    pub fn builder() -> CallGraphBuilder {
        CallGraphBuilder::default()
    }

    /// Run one call turn and return the final state.
    pub fn invoke(&self, state: CallState) -> CallState {
        self.run_turn(state).into_state()
    }

    /// Run one call turn.
    ///
    /// # Pipeline
    ///
    /// 1. Consume `test_input`, if present, as a new user transcript entry
    /// 2. Preprocess: derive `clean_text`, reset classification fields
    /// 3. Classify: copy the classifier's `NluOutput` into the state
    /// 4. Route: pick exactly one handler from the resolved intent
    /// 5. Handle: store the handler's script and next action
    ///    - on handler failure, substitute the system-error script and
    ///      return `TurnResult::Degraded`
    pub fn run_turn(&self, mut state: CallState) -> TurnResult {
        let call_id = state.call_id.clone();
        debug!(call_id = %call_id, stage = %Stage::Start, "call turn starting");

        // ── Step 1: Simulated transcription ──────────────────────────────────
        if let Some(text) = state.test_input.take() {
            debug!(call_id = %call_id, "consuming test input as user utterance");
            state.transcript.push(TranscriptEntry::user(text));
        }

        // ── Step 2: Preprocess ───────────────────────────────────────────────
        preprocess(&mut state);
        debug!(
            call_id = %call_id,
            stage = %Stage::Preprocessed,
            clean_text = %state.clean_text,
            "utterance normalized"
        );

        // ── Step 3: Classify ─────────────────────────────────────────────────
        //
        // The classifier never fails; its fallback has already run if the
        // backend misbehaved.
        let nlu = self.classifier.classify(&state.clean_text);
        state.intent = IntentLabel::Resolved(nlu.intent);
        state.confidence = clamp_confidence(nlu.confidence);
        state.entities = nlu.entities;
        debug!(
            call_id = %call_id,
            stage = %Stage::Classified,
            intent = %state.intent,
            confidence = state.confidence,
            entity_count = state.entities.len(),
            "intent classified"
        );

        // ── Step 4: Route ────────────────────────────────────────────────────
        let handler_name = route(state.intent);

        let Some(handler) = self.handlers.get(&handler_name) else {
            // Unreachable for a graph produced by the builder.
            let reason = format!("no handler registered for '{handler_name}'");
            warn!(call_id = %call_id, handler = %handler_name, %reason, "routing failed");
            return TurnResult::Degraded {
                state: state.into_system_error(),
                handler: handler_name,
                reason,
            };
        };

        // ── Step 5: Handle ───────────────────────────────────────────────────
        match handler.handle(&state.clean_text, &state.entities) {
            Ok(output) => {
                state.script = output.script;
                state.next_action = output.next_action;
                info!(
                    call_id = %call_id,
                    stage = %Stage::Handled,
                    handler = %handler_name,
                    intent = %state.intent,
                    confidence = state.confidence,
                    next_action = state.next_action.as_str(),
                    "call turn handled"
                );
                debug!(call_id = %call_id, stage = %Stage::End, "call turn finished");
                TurnResult::Handled {
                    state,
                    handler: handler_name,
                }
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(
                    call_id = %call_id,
                    handler = %handler_name,
                    %reason,
                    "handler failed; substituting system-error script"
                );
                TurnResult::Degraded {
                    state: state.into_system_error(),
                    handler: handler_name,
                    reason,
                }
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use callcenter_contracts::{
        error::{CallcenterError, CallcenterResult},
        intent::{HandlerName, Intent, IntentLabel},
        nlu::{NluOutput, CONFIDENCE_FLOOR},
        script::{extract_script_text, ScriptPayload},
        state::{CallState, NextAction, TranscriptEntry, SYSTEM_ERROR_SCRIPT},
    };

    use crate::traits::{HandlerOutput, IntentClassifier, ResponseHandler};

    use super::{CallGraph, TurnResult};

    // ── Mock helpers ─────────────────────────────────────────────────────────

    /// A classifier that returns a fixed result and records what it saw.
    struct MockClassifier {
        output: NluOutput,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl IntentClassifier for MockClassifier {
        fn classify(&self, clean_text: &str) -> NluOutput {
            self.seen.lock().unwrap().push(clean_text.to_string());
            self.output.clone()
        }
    }

    /// A handler that records every invocation into a shared log.
    struct MockHandler {
        name: HandlerName,
        calls: Arc<Mutex<Vec<(HandlerName, BTreeMap<String, String>)>>>,
        fail: bool,
    }

    impl ResponseHandler for MockHandler {
        fn handle(
            &self,
            _clean_text: &str,
            entities: &BTreeMap<String, String>,
        ) -> CallcenterResult<HandlerOutput> {
            self.calls.lock().unwrap().push((self.name, entities.clone()));
            if self.fail {
                return Err(CallcenterError::Generation {
                    reason: "backend unavailable".to_string(),
                });
            }
            Ok(HandlerOutput {
                script: ScriptPayload::from(format!("script from {}", self.name)),
                next_action: NextAction::PlayTts,
            })
        }
    }

    struct Fixture {
        graph: CallGraph,
        seen: Arc<Mutex<Vec<String>>>,
        calls: Arc<Mutex<Vec<(HandlerName, BTreeMap<String, String>)>>>,
    }

    fn fixture(output: NluOutput, failing: Option<HandlerName>) -> Fixture {
        let seen = Arc::new(Mutex::new(vec![]));
        let calls = Arc::new(Mutex::new(vec![]));

        let mut builder = CallGraph::builder().classifier(Box::new(MockClassifier {
            output,
            seen: Arc::clone(&seen),
        }));
        for name in HandlerName::ALL {
            builder = builder.handler(
                name,
                Box::new(MockHandler {
                    name,
                    calls: Arc::clone(&calls),
                    fail: failing == Some(name),
                }),
            );
        }

        Fixture {
            graph: builder.build().unwrap(),
            seen,
            calls,
        }
    }

    fn state(text: &str) -> CallState {
        CallState::new("C-TEST", vec![TranscriptEntry::user(text)])
    }

    // ── Builder ──────────────────────────────────────────────────────────────

    #[test]
    fn build_requires_a_classifier() {
        match CallGraph::builder().build() {
            Err(CallcenterError::GraphConstruction { reason }) => {
                assert!(reason.contains("classifier"));
            }
            other => panic!("expected GraphConstruction, got {:?}", other.err()),
        }
    }

    #[test]
    fn build_requires_all_six_handlers() {
        let calls = Arc::new(Mutex::new(vec![]));
        let result = CallGraph::builder()
            .classifier(Box::new(MockClassifier {
                output: NluOutput::new(Intent::BillingIssue, 0.9),
                seen: Arc::new(Mutex::new(vec![])),
            }))
            .handler(
                HandlerName::BillingIssue,
                Box::new(MockHandler {
                    name: HandlerName::BillingIssue,
                    calls,
                    fail: false,
                }),
            )
            .build();

        match result {
            Err(CallcenterError::GraphConstruction { reason }) => {
                assert!(reason.contains("sim_not_working_handler"));
                assert!(!reason.contains("billing_issue_handler"));
            }
            other => panic!("expected GraphConstruction, got {:?}", other.err()),
        }
    }

    // ── Turn execution ───────────────────────────────────────────────────────

    /// Exactly one handler runs, and it is the one the intent routes to.
    #[test]
    fn runs_exactly_one_routed_handler() {
        let fx = fixture(NluOutput::new(Intent::InternetSpeedSlow, 0.8), None);
        let result = fx.graph.run_turn(state("  Internet is SLOW  "));

        assert!(!result.is_degraded());
        assert_eq!(result.handler(), HandlerName::InternetSpeedSlow);

        let calls = fx.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, HandlerName::InternetSpeedSlow);

        assert_eq!(*fx.seen.lock().unwrap(), vec!["internet is slow".to_string()]);

        let final_state = result.into_state();
        assert_eq!(final_state.intent, IntentLabel::Resolved(Intent::InternetSpeedSlow));
        assert_eq!(final_state.next_action, NextAction::PlayTts);
        assert_eq!(
            extract_script_text(Some(&final_state.script)),
            "script from internet_speed_slow_handler"
        );
    }

    #[test]
    fn entities_are_passed_to_the_handler() {
        let mut output = NluOutput::new(Intent::DataNotWorkingAfterRecharge, 0.98);
        output.entities.insert("recharge_amount".to_string(), "199".to_string());
        let fx = fixture(output, None);

        let final_state = fx.graph.invoke(state("recharged 199 but no data"));

        let calls = fx.calls.lock().unwrap();
        assert_eq!(calls[0].1.get("recharge_amount").map(String::as_str), Some("199"));
        assert_eq!(final_state.entities.get("recharge_amount").map(String::as_str), Some("199"));
    }

    /// A classifier reporting 0.0 still yields the floor, never zero.
    #[test]
    fn confidence_is_clamped_after_classification() {
        let mut output = NluOutput::new(Intent::BillingIssue, 0.5);
        output.confidence = 0.0;
        let fx = fixture(output, None);

        let final_state = fx.graph.invoke(state("bill"));
        assert_eq!(final_state.confidence, CONFIDENCE_FLOOR);
    }

    #[test]
    fn handler_failure_degrades_to_system_error() {
        let fx = fixture(
            NluOutput::new(Intent::SimNotWorking, 0.9),
            Some(HandlerName::SimNotWorking),
        );
        let result = fx.graph.run_turn(state("sim not detected"));

        match &result {
            TurnResult::Degraded { handler, reason, .. } => {
                assert_eq!(*handler, HandlerName::SimNotWorking);
                assert!(reason.contains("backend unavailable"));
            }
            other => panic!("expected Degraded, got {:?}", other),
        }

        let final_state = result.into_state();
        assert_eq!(extract_script_text(Some(&final_state.script)), SYSTEM_ERROR_SCRIPT);
        assert_eq!(final_state.intent, IntentLabel::SystemError);
        assert_eq!(final_state.confidence, 0.0);
    }

    #[test]
    fn test_input_is_consumed_as_user_utterance() {
        let fx = fixture(NluOutput::new(Intent::NoNetworkCoverage, 0.7), None);
        let initial = CallState::new("C-SIM", vec![]).with_test_input("No Signal At Home");

        let final_state = fx.graph.invoke(initial);

        assert!(final_state.test_input.is_none());
        assert_eq!(final_state.transcript.len(), 1);
        assert_eq!(final_state.clean_text, "no signal at home");
    }

    /// Turn 2 must not see turn 1's entities or intent before it classifies.
    #[test]
    fn sequential_turns_do_not_leak_classification() {
        let mut output = NluOutput::new(Intent::BillingIssue, 0.9);
        output.entities.insert("account_number".to_string(), "42".to_string());
        let fx = fixture(output, None);

        let first = fx.graph.invoke(state("my bill is wrong"));
        assert!(first.entities.contains_key("account_number"));

        let mut second = first.clone();
        second.transcript.push(TranscriptEntry::user("and my sim died"));
        crate::preprocess::preprocess(&mut second);

        assert_eq!(second.clean_text, "and my sim died");
        assert_eq!(second.intent, IntentLabel::Unknown);
        assert_eq!(second.confidence, 0.0);
        assert!(second.entities.is_empty());
    }
}
