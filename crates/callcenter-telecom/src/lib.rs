//! # callcenter-telecom
//!
//! Telecom reference wiring for the call-turn runtime.
//!
//! - `templates`: prompt template, permitted action labels and word cap for
//!   each of the six intents
//! - `handler`: `ScriptedHandler`, the one handler type parameterized by
//!   template
//! - `graph`: `build_call_graph`, which assembles classifier and handlers
//!   around a shared `TextGenerator`
//! - `scenarios`: runnable end-to-end scenarios with deterministic backends
//!
//! No scenario makes a network call.

pub mod graph;
pub mod handler;
pub mod scenarios;
pub mod templates;

pub use graph::build_call_graph;
pub use handler::ScriptedHandler;
pub use templates::HandlerTemplate;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use serde_json::{json, Value};

    use callcenter_contracts::{
        error::{CallcenterError, CallcenterResult},
        intent::{HandlerName, Intent, IntentLabel},
        nlu::{CONFIDENCE_FLOOR, FALLBACK_CONFIDENCE},
        script::{extract_script_text, ScriptParts, ScriptPayload},
        state::{CallState, NextAction, Speaker, TranscriptEntry, SYSTEM_ERROR_SCRIPT},
    };
    use callcenter_core::{
        traits::{ResponseHandler, TextGenerator},
        CallSession,
    };
    use callcenter_llm::{GroqClient, LlmConfig, OfflineGenerator};
    use callcenter_log::InMemoryCallLogWriter;
    use callcenter_nlu::KeywordTable;

    use super::{build_call_graph, scenarios, HandlerTemplate, ScriptedHandler};

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// Answers every structured call with `classification` and records the
    /// free-text prompts it receives.
    struct RecordingGenerator {
        classification: Value,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl TextGenerator for RecordingGenerator {
        fn invoke(&self, prompt: &str) -> CallcenterResult<ScriptPayload> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(ScriptPayload::Structured(json!({
                "content": "Ticket created, resolution within 48 hours.\nopen-billing-ticket\namount 3500 disputed"
            })))
        }

        fn invoke_structured(&self, _prompt: &str, _schema: &Value) -> CallcenterResult<Value> {
            Ok(self.classification.clone())
        }
    }

    fn turn(text: &str) -> CallState {
        CallState::new("C-TEST", vec![TranscriptEntry::user(text)])
    }

    // ── Scenarios ─────────────────────────────────────────────────────────────

    /// Every bundled scenario passes all of its checks.
    #[test]
    fn all_scenarios_pass() {
        let reports = scenarios::run_all().unwrap();
        assert_eq!(reports.len(), 5);
        for report in &reports {
            let failed: Vec<&str> = report
                .checks
                .iter()
                .filter(|c| !c.passed)
                .map(|c| c.name)
                .collect();
            assert!(failed.is_empty(), "{}: failed checks {:?}", report.title, failed);
        }
    }

    #[test]
    fn billing_scenario_routes_to_billing_handler() {
        let report = scenarios::billing_with_capability_disabled().unwrap();
        assert_eq!(report.handler, Some(HandlerName::BillingIssue));
        assert_eq!(report.final_state.next_action, NextAction::PlayTts);
    }

    // ── Properties ────────────────────────────────────────────────────────────

    /// With the capability disabled, every utterance still resolves to a
    /// canonical intent at the fallback confidence.
    #[test]
    fn offline_turns_always_resolve_to_a_canonical_intent() {
        let graph = build_call_graph(Arc::new(OfflineGenerator), KeywordTable::default()).unwrap();
        let utterances = [
            "",
            "   ",
            "hello?",
            "MY SIM IS DEAD",
            "no signal, no bars, nothing",
            "recharge done but data off",
            "calls drop every five minutes",
            "¿dónde está mi factura?",
        ];
        for text in utterances {
            let state = graph.invoke(turn(text));
            assert!(state.intent.intent().is_some(), "unresolved for {text:?}");
            assert_eq!(state.confidence, FALLBACK_CONFIDENCE);
            assert_eq!(state.next_action, NextAction::PlayTts);
        }
    }

    /// Accepted classifications keep their confidence inside the floor and
    /// ceiling, whatever the backend claims.
    #[test]
    fn accepted_confidence_is_bounded() {
        for (claimed, expected) in [(0.0, CONFIDENCE_FLOOR), (0.75, 0.75), (3.5, 1.0), (-1.0, CONFIDENCE_FLOOR)] {
            let generator = RecordingGenerator {
                classification: json!({ "intent": "Call Drops Frequently", "confidence": claimed }),
                prompts: Arc::new(Mutex::new(vec![])),
            };
            let graph = build_call_graph(Arc::new(generator), KeywordTable::default()).unwrap();
            let state = graph.invoke(turn("calls keep dropping"));
            assert_eq!(state.confidence, expected, "claimed {claimed}");
        }
    }

    /// An out-of-domain label from the backend never reaches the state.
    #[test]
    fn out_of_domain_label_is_replaced_by_fallback() {
        let generator = RecordingGenerator {
            classification: json!({ "intent": "Unknown", "confidence": 0.99, "entities": { "amount": "9" } }),
            prompts: Arc::new(Mutex::new(vec![])),
        };
        let graph = build_call_graph(Arc::new(generator), KeywordTable::default()).unwrap();
        let state = graph.invoke(turn("my data pack is not working after recharge"));

        assert_eq!(state.intent, IntentLabel::Resolved(Intent::DataNotWorkingAfterRecharge));
        assert_eq!(state.confidence, FALLBACK_CONFIDENCE);
        assert!(state.entities.is_empty());
    }

    /// Normalized entities reach the handler prompt, and the structured
    /// script payload extracts to its text.
    #[test]
    fn entities_flow_into_handler_prompt() {
        let prompts = Arc::new(Mutex::new(vec![]));
        let generator = RecordingGenerator {
            classification: json!({
                "intent": "Billing Issue",
                "confidence": 0.95,
                "entities": { "Account_Number": "98765-43210", "amount": "3500" }
            }),
            prompts: Arc::clone(&prompts),
        };
        let graph = build_call_graph(Arc::new(generator), KeywordTable::default()).unwrap();
        let state = graph.invoke(turn("My bill is 3500, account 98765-43210"));

        assert_eq!(state.entities["account_number"], "9876543210");
        let sent = prompts.lock().unwrap();
        assert_eq!(sent.len(), 1, "exactly one handler runs per turn");
        assert!(sent[0].contains("\"account_number\":\"9876543210\""));
        assert!(sent[0].contains("my bill is 3500, account 98765-43210"));

        let text = extract_script_text(Some(&state.script));
        let parts = ScriptParts::parse(&text).unwrap();
        assert!(Intent::BillingIssue.permits_action(parts.action().unwrap()));
    }

    /// Offline replies only carry action labels the routed intent permits.
    #[test]
    fn offline_replies_use_permitted_actions() {
        for intent in Intent::ALL {
            let handler = ScriptedHandler::new(intent, Arc::new(OfflineGenerator));
            let output = handler.handle("my service has a problem", &BTreeMap::new()).unwrap();
            let text = extract_script_text(Some(&output.script));
            let action = ScriptParts::parse(&text).and_then(|parts| parts.action());
            assert!(
                action.is_some_and(|a| intent.permits_action(a)),
                "{intent}: offline action {action:?} not permitted"
            );
        }

        let graph = build_call_graph(Arc::new(OfflineGenerator), KeywordTable::default()).unwrap();
        for text in ["my bill is wrong, overcharged 500 rupees", "my sim is dead"] {
            let state = graph.invoke(turn(text));
            let intent = state.intent.intent().unwrap();
            let parts = ScriptParts::parse(&extract_script_text(Some(&state.script))).unwrap();
            assert!(intent.permits_action(parts.action().unwrap()), "{text:?}");
        }
    }

    // ── Templates and handlers ────────────────────────────────────────────────

    #[test]
    fn each_template_lists_its_own_action_labels() {
        for intent in Intent::ALL {
            let template = HandlerTemplate::for_intent(intent);
            assert_eq!(template.intent, intent);
            let prompt = template.render("text", &BTreeMap::new());
            for action in intent.action_labels() {
                assert!(prompt.contains(action.as_str()), "{intent}: {action} missing");
            }
            assert!(prompt.contains(&format!("at most {} words", template.word_cap)));
            assert!(prompt.contains("follow-up question"));
            // Handlers only see the text and entities.
            assert!(!prompt.contains("confidence"), "{intent}: prompt asks for confidence");
        }
        assert_eq!(HandlerTemplate::for_intent(Intent::SimNotWorking).word_cap, 20);
        assert_eq!(HandlerTemplate::for_intent(Intent::BillingIssue).word_cap, 25);
    }

    #[test]
    fn handler_failure_propagates_to_graph() {
        let handler = ScriptedHandler::new(Intent::NoNetworkCoverage, Arc::new(
            scenarios::ScriptedGenerator::new(Vec::new(), None),
        ));
        assert_eq!(handler.intent(), Intent::NoNetworkCoverage);
        match handler.handle("no signal", &BTreeMap::new()) {
            Err(CallcenterError::Generation { .. }) => {}
            other => panic!("expected Generation error, got {:?}", other),
        }
    }

    // ── Session integration ───────────────────────────────────────────────────

    /// A backend that cannot be constructed still yields a usable turn.
    #[test]
    fn unconfigured_backend_yields_system_error_turn() {
        let graph = GroqClient::new(LlmConfig::default())
            .and_then(|client| build_call_graph(Arc::new(client), KeywordTable::default()));
        assert!(graph.is_err());

        let log = InMemoryCallLogWriter::new();
        let mut session = CallSession::start();
        let state = session.take_turn(graph.as_ref().ok(), "my bill is wrong", &log).unwrap();

        assert_eq!(extract_script_text(Some(&state.script)), SYSTEM_ERROR_SCRIPT);
        assert_eq!(state.intent, IntentLabel::SystemError);
        assert_eq!(state.confidence, 0.0);
        assert!(log.export_log(session.call_id()).is_some());
    }

    #[test]
    fn offline_call_records_every_turn() {
        let graph = build_call_graph(Arc::new(OfflineGenerator), KeywordTable::default()).unwrap();
        let log = InMemoryCallLogWriter::new();
        let mut session = CallSession::start();

        session.take_turn(Some(&graph), "my calls drop", &log).unwrap();
        session.take_turn(Some(&graph), "and the internet is slow", &log).unwrap();
        session.end();

        let speakers: Vec<Speaker> = session.transcript().iter().map(|e| e.speaker).collect();
        assert_eq!(
            speakers,
            vec![Speaker::User, Speaker::Agent, Speaker::User, Speaker::Agent, Speaker::System]
        );
        let recorded = log.export_log(session.call_id()).unwrap();
        assert_eq!(recorded.turns.len(), 2);
        assert_eq!(recorded.turns[1].state["intent"], "Internet Speed Slow");
        assert!(log.verify_integrity(session.call_id()));
    }
}
