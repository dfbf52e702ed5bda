//! Prompt templates for the six intent handlers.
//!
//! Every handler asks for the same three lines (customer message, internal
//! action label, internal note). Templates differ only in persona, in the
//! guidance for the customer line and the note, in the permitted action
//! labels and in the word cap.

use std::collections::BTreeMap;

use callcenter_contracts::intent::Intent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerTemplate {
    pub intent: Intent,
    pub persona: &'static str,
    /// What the customer-facing line should accomplish, with an example.
    pub customer_guidance: &'static str,
    pub note_guidance: &'static str,
    /// Maximum words in the customer-facing line.
    pub word_cap: usize,
    pub extra_constraints: &'static [&'static str],
}

static TEMPLATES: [HandlerTemplate; 6] = [
    HandlerTemplate {
        intent: Intent::BillingIssue,
        persona: "You are a senior telecom billing agent.",
        customer_guidance: "one sentence acknowledging the complaint and stating a decisive resolution or next step",
        note_guidance: "why this action was chosen, citing the extracted entities",
        word_cap: 25,
        extra_constraints: &[
            "If a ticket is needed, state the expected SLA (for example \"Ticket created, resolution within 48 hours\").",
            "Never ask the customer to send documents.",
        ],
    },
    HandlerTemplate {
        intent: Intent::SimNotWorking,
        persona: "You are a telecom support agent handling a SIM that is not working.",
        customer_guidance: "one clear instruction or resolution; give the common immediate fix when one exists (for example \"Restart the phone and reinsert the SIM; if it still fails we will re-provision it.\")",
        note_guidance: "a diagnostic note citing the extracted entities",
        word_cap: 20,
        extra_constraints: &["Keep the customer line deterministic."],
    },
    HandlerTemplate {
        intent: Intent::NoNetworkCoverage,
        persona: "You are a telecom field-support agent handling a no-coverage complaint.",
        customer_guidance: "one message that explains the cause or gives a decisive next step (for example \"We will raise a tower inspection ticket and notify you.\")",
        note_guidance: "suggested urgency plus the referenced location and account entities",
        word_cap: 25,
        extra_constraints: &["If a location entity is present, include it in the internal note."],
    },
    HandlerTemplate {
        intent: Intent::InternetSpeedSlow,
        persona: "You are a telecom troubleshooting agent handling slow internet speed.",
        customer_guidance: "one concise resolution or definitive next step (for example \"We will run an automated profile reset; expect improvement within 30 minutes.\")",
        note_guidance: "a diagnostic note with suggested measurements such as a speed test, time of day and device",
        word_cap: 25,
        extra_constraints: &["Keep the chosen action deterministic."],
    },
    HandlerTemplate {
        intent: Intent::DataNotWorkingAfterRecharge,
        persona: "You are a support agent handling mobile data that stopped working after a recharge.",
        customer_guidance: "one sentence with the resolution or immediate step (for example \"We have re-provisioned your data; please restart your device now.\")",
        note_guidance: "the recharge amount and date if known, and whether automatic re-provisioning was attempted",
        word_cap: 25,
        extra_constraints: &["If a recharge amount or date was extracted, reference it in the internal note."],
    },
    HandlerTemplate {
        intent: Intent::CallDropsFrequently,
        persona: "You are a network reliability specialist handling frequent call drops.",
        customer_guidance: "one diagnostic or action (for example \"We will raise a network investigation ticket; expect an update within 48 hours.\")",
        note_guidance: "the probable cause, citing any location or device entities",
        word_cap: 25,
        extra_constraints: &["Keep the customer line short and concrete."],
    },
];

impl HandlerTemplate {
    /// The template for `intent`.
    pub fn for_intent(intent: Intent) -> &'static HandlerTemplate {
        match intent {
            Intent::BillingIssue => &TEMPLATES[0],
            Intent::SimNotWorking => &TEMPLATES[1],
            Intent::NoNetworkCoverage => &TEMPLATES[2],
            Intent::InternetSpeedSlow => &TEMPLATES[3],
            Intent::DataNotWorkingAfterRecharge => &TEMPLATES[4],
            Intent::CallDropsFrequently => &TEMPLATES[5],
        }
    }

    /// Fill the template for one utterance.
    pub fn render(&self, clean_text: &str, entities: &BTreeMap<String, String>) -> String {
        let actions = self
            .intent
            .action_labels()
            .iter()
            .map(|a| format!("\"{}\"", a.as_str()))
            .collect::<Vec<_>>()
            .join(", ");

        let entities_json =
            serde_json::to_string(entities).unwrap_or_else(|_| "{}".to_string());

        let mut constraints = vec![
            "Do not ask the customer any follow-up question.".to_string(),
            format!("Keep the customer-facing line to at most {} words.", self.word_cap),
        ];
        constraints.extend(self.extra_constraints.iter().map(|c| c.to_string()));
        let constraints = constraints
            .iter()
            .map(|c| format!("- {c}"))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{persona}\n\
             Reply with exactly three lines of plain text:\n\
             1) Customer message: {customer}.\n\
             2) Internal action label, exactly one of [{actions}].\n\
             3) Internal note on one line: {note}.\n\
             \n\
             Constraints:\n\
             {constraints}\n\
             \n\
             Caller said: \"{clean_text}\"\n\
             Extracted entities: {entities_json}",
            persona = self.persona,
            customer = self.customer_guidance,
            note = self.note_guidance,
        )
    }
}
