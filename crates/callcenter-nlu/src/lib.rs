//! # callcenter-nlu
//!
//! Intent classification for the call-turn runtime.
//!
//! - `classifier`: `LlmIntentClassifier`, the `IntentClassifier` used in
//!   production
//! - `keywords`: the deterministic keyword table behind the fallback
//! - `schema`: the structured-output JSON Schema and its validator

pub mod classifier;
pub mod keywords;
pub mod schema;

pub use classifier::LlmIntentClassifier;
pub use keywords::KeywordTable;
