//! The parameterized response handler.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use callcenter_contracts::{error::CallcenterResult, intent::Intent, state::NextAction};
use callcenter_core::traits::{HandlerOutput, ResponseHandler, TextGenerator};

use crate::templates::HandlerTemplate;

/// One intent's handler: render its template, call the generator, store the
/// raw payload.
///
/// The generated text is not parsed or checked here; presentation code uses
/// `extract_script_text` and `ScriptParts`.
pub struct ScriptedHandler {
    template: &'static HandlerTemplate,
    generator: Arc<dyn TextGenerator>,
}

impl ScriptedHandler {
    pub fn new(intent: Intent, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            template: HandlerTemplate::for_intent(intent),
            generator,
        }
    }

    pub fn intent(&self) -> Intent {
        self.template.intent
    }
}

impl ResponseHandler for ScriptedHandler {
    fn handle(
        &self,
        clean_text: &str,
        entities: &BTreeMap<String, String>,
    ) -> CallcenterResult<HandlerOutput> {
        let prompt = self.template.render(clean_text, entities);
        debug!(intent = %self.template.intent, "generating handler script");

        let script = self.generator.invoke(&prompt)?;
        Ok(HandlerOutput {
            script,
            next_action: NextAction::PlayTts,
        })
    }
}
