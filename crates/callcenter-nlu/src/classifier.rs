//! Language-model intent classifier with keyword fallback.
//!
//! `LlmIntentClassifier` implements `IntentClassifier`. Each call tries the
//! structured-output path first:
//!
//! 1. Ask the generator for a JSON object shaped by `nlu_output_schema`.
//! 2. Reject an `intent` outside the canonical set.
//! 3. Validate the whole object against the schema.
//! 4. Decode it, clamp the confidence and normalize the entities.
//!
//! Any failure along the way is logged and replaced by the keyword fallback
//! at `FALLBACK_CONFIDENCE` with no entities. `classify` therefore never
//! fails and never yields `Unknown`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use callcenter_contracts::{
    intent::Intent,
    nlu::{clamp_confidence, ClassificationError, NluOutput, FALLBACK_CONFIDENCE},
};
use callcenter_core::traits::{IntentClassifier, TextGenerator};

use crate::{
    keywords::KeywordTable,
    schema::{nlu_output_schema, validate},
};

/// Entity keys whose values are reduced to their digits.
pub const NUMERIC_ENTITY_KEYS: [&str; 5] = [
    "account_number",
    "subscriber_id",
    "phone_number",
    "recharge_amount",
    "amount",
];

/// Wire shape of the structured response, decoded after validation.
#[derive(Debug, Deserialize)]
struct RawNluOutput {
    intent: Intent,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    entities: BTreeMap<String, Value>,
    #[serde(default)]
    notes: Option<String>,
}

pub struct LlmIntentClassifier {
    generator: Arc<dyn TextGenerator>,
    keywords: KeywordTable,
    schema: Value,
}

impl LlmIntentClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>, keywords: KeywordTable) -> Self {
        Self {
            generator,
            keywords,
            schema: nlu_output_schema(),
        }
    }

    pub fn keywords(&self) -> &KeywordTable {
        &self.keywords
    }

    /// Run only the language-model path.
    pub fn try_classify(&self, clean_text: &str) -> Result<NluOutput, ClassificationError> {
        let prompt = build_prompt(clean_text);

        let value = self
            .generator
            .invoke_structured(&prompt, &self.schema)
            .map_err(|e| ClassificationError::Capability {
                reason: e.to_string(),
            })?;

        if let Some(label) = value.get("intent").and_then(Value::as_str) {
            if label.parse::<Intent>().is_err() {
                return Err(ClassificationError::InvalidIntent {
                    label: label.to_string(),
                });
            }
        }

        validate(&self.schema, &value)
            .map_err(|failures| ClassificationError::SchemaViolation { failures })?;

        let raw: RawNluOutput =
            serde_json::from_value(value).map_err(|e| ClassificationError::Malformed {
                reason: e.to_string(),
            })?;

        Ok(NluOutput {
            intent: raw.intent,
            confidence: clamp_confidence(raw.confidence),
            entities: normalize_entities(raw.entities),
            notes: raw.notes,
        })
    }

    /// The deterministic answer used whenever the language-model path fails.
    pub fn fallback(&self, clean_text: &str) -> NluOutput {
        NluOutput {
            notes: Some("keyword fallback".to_string()),
            ..NluOutput::new(self.keywords.classify(clean_text), FALLBACK_CONFIDENCE)
        }
    }
}

impl IntentClassifier for LlmIntentClassifier {
    fn classify(&self, clean_text: &str) -> NluOutput {
        match self.try_classify(clean_text) {
            Ok(output) => {
                debug!(intent = %output.intent, confidence = output.confidence, "structured classification accepted");
                output
            }
            Err(e) => {
                let output = self.fallback(clean_text);
                warn!(error = %e, intent = %output.intent, "structured classification rejected; using keyword fallback");
                output
            }
        }
    }
}

/// Canonicalize extracted entities.
///
/// Keys are trimmed and lower-cased. Numbers become strings. Values under
/// `NUMERIC_ENTITY_KEYS` keep only their digits unless that leaves nothing.
/// Empty values and non-scalar values are dropped.
pub fn normalize_entities(raw: BTreeMap<String, Value>) -> BTreeMap<String, String> {
    raw.into_iter()
        .filter_map(|(key, value)| {
            let key = key.trim().to_lowercase();
            let value = match value {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            if key.is_empty() || value.is_empty() {
                return None;
            }

            let value = if NUMERIC_ENTITY_KEYS.contains(&key.as_str()) {
                let digits: String = value.chars().filter(char::is_ascii_digit).collect();
                if digits.is_empty() {
                    value
                } else {
                    digits
                }
            } else {
                value
            };
            Some((key, value))
        })
        .collect()
}

/// The classification prompt for one cleaned utterance.
pub fn build_prompt(clean_text: &str) -> String {
    let intents = Intent::ALL
        .iter()
        .map(|i| format!("\"{}\"", i.label()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are the language-understanding stage of a telecom call center.

Tasks:
1) Pick exactly one intent for the caller's utterance from: [{intents}].
   Never answer with an intent outside this list; choose the closest match.
2) Extract entities as key/value strings. Prefer the keys account_number,
   subscriber_id, phone_number, amount, recharge_amount, plan_name, date,
   time, location, device_model and error_code. Strip non-digits from
   phone and account numbers. Write dates as YYYY-MM-DD when possible.
3) Reply with one JSON object and nothing else:
   {{"intent": "<label>", "confidence": <0.0 to 1.0>, "entities": {{...}}, "notes": "<short internal note>"}}

Examples:
"my bill is 3500 and i think they overcharged my account 9876543210"
-> {{"intent": "Billing Issue", "confidence": 0.95, "entities": {{"account_number": "9876543210", "amount": "3500"}}, "notes": "possible overcharge"}}
"after recharging 199 my data still doesn't work since 01-06-2025"
-> {{"intent": "Data Not Working After Recharge", "confidence": 0.98, "entities": {{"recharge_amount": "199", "date": "2025-06-01"}}, "notes": "fresh recharge"}}
"i keep getting dropped calls in my area"
-> {{"intent": "Call Drops Frequently", "confidence": 0.9, "entities": {{"location": "user_reported_area"}}, "notes": "area instability"}}

Utterance: "{clean_text}""#
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use serde_json::{json, Value};

    use callcenter_contracts::{
        error::{CallcenterError, CallcenterResult},
        intent::Intent,
        nlu::{ClassificationError, CONFIDENCE_FLOOR, FALLBACK_CONFIDENCE},
        script::ScriptPayload,
    };
    use callcenter_core::traits::{IntentClassifier, TextGenerator};

    use crate::keywords::KeywordTable;

    use super::{build_prompt, normalize_entities, LlmIntentClassifier};

    /// Replies to structured calls with a canned result and records prompts.
    struct CannedGenerator {
        reply: CallcenterResult<Value>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl CannedGenerator {
        fn ok(value: Value) -> Self {
            Self {
                reply: Ok(value),
                prompts: Arc::new(Mutex::new(vec![])),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(CallcenterError::Generation {
                    reason: "backend unreachable".to_string(),
                }),
                prompts: Arc::new(Mutex::new(vec![])),
            }
        }
    }

    impl TextGenerator for CannedGenerator {
        fn invoke(&self, _prompt: &str) -> CallcenterResult<ScriptPayload> {
            Ok(ScriptPayload::default())
        }

        fn invoke_structured(&self, prompt: &str, _schema: &Value) -> CallcenterResult<Value> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(v) => Ok(v.clone()),
                Err(e) => Err(CallcenterError::Generation {
                    reason: e.to_string(),
                }),
            }
        }
    }

    fn classifier(generator: CannedGenerator) -> LlmIntentClassifier {
        LlmIntentClassifier::new(Arc::new(generator), KeywordTable::default())
    }

    #[test]
    fn accepted_output_is_clamped_and_normalized() {
        let c = classifier(CannedGenerator::ok(json!({
            "intent": "Billing Issue",
            "confidence": 0.92,
            "entities": { " Account_Number ": "98-765 43210", "amount": 3500 },
            "notes": "possible overcharge"
        })));

        let out = c.classify("my bill is wrong");
        assert_eq!(out.intent, Intent::BillingIssue);
        assert_eq!(out.confidence, 0.92);
        assert_eq!(out.entities["account_number"], "9876543210");
        assert_eq!(out.entities["amount"], "3500");
        assert_eq!(out.notes.as_deref(), Some("possible overcharge"));
    }

    #[test]
    fn confidence_outside_range_is_clamped() {
        let high = classifier(CannedGenerator::ok(json!({ "intent": "SIM Not Working", "confidence": 1.7 })));
        assert_eq!(high.classify("sim dead").confidence, 1.0);

        let missing = classifier(CannedGenerator::ok(json!({ "intent": "SIM Not Working" })));
        assert_eq!(missing.classify("sim dead").confidence, CONFIDENCE_FLOOR);
    }

    /// A nested entity value is dropped; the classification itself stands.
    #[test]
    fn nested_entity_keeps_model_classification() {
        let c = classifier(CannedGenerator::ok(json!({
            "intent": "SIM Not Working",
            "confidence": 0.9,
            "entities": { "account_number": "42", "device": { "model": "x" } }
        })));

        let out = c.try_classify("my bill and my sim").unwrap();
        assert_eq!(out.intent, Intent::SimNotWorking);
        assert_eq!(out.confidence, 0.9);
        assert_eq!(out.entities.len(), 1);
        assert_eq!(out.entities["account_number"], "42");
        assert!(out.notes.is_none());
    }

    #[test]
    fn capability_failure_falls_back_to_keywords() {
        let c = classifier(CannedGenerator::failing());
        let out = c.classify("my calls keep dropping");
        assert_eq!(out.intent, Intent::CallDropsFrequently);
        assert_eq!(out.confidence, FALLBACK_CONFIDENCE);
        assert!(out.entities.is_empty());

        match c.try_classify("my calls keep dropping") {
            Err(ClassificationError::Capability { reason }) => assert!(reason.contains("backend unreachable")),
            other => panic!("expected Capability error, got {:?}", other),
        }
    }

    #[test]
    fn out_of_domain_intent_falls_back() {
        let c = classifier(CannedGenerator::ok(json!({
            "intent": "Weather",
            "confidence": 0.99,
            "entities": { "location": "pune" }
        })));

        match c.try_classify("internet speed is slow") {
            Err(ClassificationError::InvalidIntent { label }) => assert_eq!(label, "Weather"),
            other => panic!("expected InvalidIntent, got {:?}", other),
        }

        let out = c.classify("internet speed is slow");
        assert_eq!(out.intent, Intent::InternetSpeedSlow);
        assert_eq!(out.confidence, FALLBACK_CONFIDENCE);
        assert!(out.entities.is_empty());
    }

    #[test]
    fn schema_violation_falls_back() {
        let c = classifier(CannedGenerator::ok(json!({ "confidence": 0.8 })));
        match c.try_classify("no signal") {
            Err(ClassificationError::SchemaViolation { failures }) => assert!(!failures.is_empty()),
            other => panic!("expected SchemaViolation, got {:?}", other),
        }
        assert_eq!(c.classify("no signal").intent, Intent::NoNetworkCoverage);
    }

    /// Empty input with a failing capability still yields a canonical intent.
    #[test]
    fn empty_text_fallback_is_canonical() {
        let c = classifier(CannedGenerator::failing());
        let out = c.classify("");
        assert_eq!(out.intent, Intent::BillingIssue);
        assert_eq!(out.confidence, FALLBACK_CONFIDENCE);
    }

    #[test]
    fn prompt_carries_utterance_and_every_label() {
        let generator = CannedGenerator::ok(json!({ "intent": "Billing Issue", "confidence": 0.9 }));
        let prompts = Arc::clone(&generator.prompts);
        classifier(generator).classify("my bill is wrong");

        let sent = prompts.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Utterance: \"my bill is wrong\""));
        for intent in Intent::ALL {
            assert!(build_prompt("x").contains(intent.label()));
        }
    }

    #[test]
    fn entity_normalization_rules() {
        let mut raw = BTreeMap::new();
        raw.insert("PHONE_NUMBER".to_string(), json!("+91 98765-43210"));
        raw.insert("recharge_amount".to_string(), json!("Rs. 199"));
        raw.insert("amount".to_string(), json!("unknown"));
        raw.insert("location".to_string(), json!("  Pune "));
        raw.insert("date".to_string(), json!(""));
        raw.insert("device".to_string(), json!({ "nested": true }));

        let out = normalize_entities(raw);
        assert_eq!(out["phone_number"], "919876543210");
        assert_eq!(out["recharge_amount"], "199");
        assert_eq!(out["amount"], "unknown");
        assert_eq!(out["location"], "Pune");
        assert!(!out.contains_key("date"));
        assert!(!out.contains_key("device"));
    }
}
