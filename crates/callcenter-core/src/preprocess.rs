//! The first stage of a call turn.

use std::collections::BTreeMap;

use callcenter_contracts::{intent::IntentLabel, state::CallState};

/// Normalize the latest utterance and clear the previous classification.
///
/// Sets `clean_text` to the trimmed, lower-cased text of the last transcript
/// entry (empty when the transcript is empty) and resets `intent`,
/// `confidence`, and `entities`, so nothing from an earlier turn survives
/// into this one. Total and idempotent.
pub fn preprocess(state: &mut CallState) {
    state.clean_text = state
        .last_entry()
        .map(|entry| entry.text.trim().to_lowercase())
        .unwrap_or_default();

    state.intent = IntentLabel::Unknown;
    state.confidence = 0.0;
    state.entities = BTreeMap::new();
}

#[cfg(test)]
mod tests {
    use callcenter_contracts::{
        intent::{Intent, IntentLabel},
        state::{CallState, TranscriptEntry},
    };

    use super::preprocess;

    #[test]
    fn cleans_last_entry_only() {
        let mut state = CallState::new(
            "C-1",
            vec![
                TranscriptEntry::user("First Thing"),
                TranscriptEntry::agent("Noted."),
                TranscriptEntry::user("  My SIM Is DEAD \n"),
            ],
        );
        preprocess(&mut state);
        assert_eq!(state.clean_text, "my sim is dead");
    }

    #[test]
    fn empty_transcript_gives_empty_text() {
        let mut state = CallState::new("C-1", vec![]);
        preprocess(&mut state);
        assert_eq!(state.clean_text, "");
    }

    #[test]
    fn resets_previous_classification() {
        let mut state = CallState::new("C-1", vec![TranscriptEntry::user("hello")]);
        state.intent = IntentLabel::Resolved(Intent::BillingIssue);
        state.confidence = 0.93;
        state.entities.insert("account_number".to_string(), "123".to_string());

        preprocess(&mut state);

        assert_eq!(state.intent, IntentLabel::Unknown);
        assert_eq!(state.confidence, 0.0);
        assert!(state.entities.is_empty());
    }

    #[test]
    fn running_twice_is_idempotent() {
        let mut state = CallState::new("C-1", vec![TranscriptEntry::user("  Slow INTERNET ")]);
        preprocess(&mut state);
        let first = state.clone();
        preprocess(&mut state);
        assert_eq!(state.clean_text, first.clean_text);
        assert_eq!(state, first);
    }
}
