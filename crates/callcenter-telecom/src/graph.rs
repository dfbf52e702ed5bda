//! Assembly of the telecom call graph.

use std::sync::Arc;

use callcenter_contracts::{
    error::CallcenterResult,
    intent::{Intent, IntentLabel},
};
use callcenter_core::{router::route, traits::TextGenerator, CallGraph};
use callcenter_nlu::{KeywordTable, LlmIntentClassifier};

use crate::handler::ScriptedHandler;

/// Build the graph: an `LlmIntentClassifier` with `keywords` as fallback and
/// one `ScriptedHandler` per intent, all sharing `generator`.
pub fn build_call_graph(
    generator: Arc<dyn TextGenerator>,
    keywords: KeywordTable,
) -> CallcenterResult<CallGraph> {
    let classifier = LlmIntentClassifier::new(Arc::clone(&generator), keywords);

    Intent::ALL
        .into_iter()
        .fold(
            CallGraph::builder().classifier(Box::new(classifier)),
            |builder, intent| {
                builder.handler(
                    route(IntentLabel::Resolved(intent)),
                    Box::new(ScriptedHandler::new(intent, Arc::clone(&generator))),
                )
            },
        )
        .build()
}
