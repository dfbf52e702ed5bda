//! Intent → handler routing.

use callcenter_contracts::intent::{HandlerName, Intent, IntentLabel};

/// The handler that receives any turn whose intent is not a canonical one.
pub const CATCH_ALL_HANDLER: HandlerName = HandlerName::CallDropsFrequently;

/// Map a classified intent to exactly one handler.
///
/// Every canonical intent has its own handler. `Unknown` and `SystemError`
/// cannot reach the router while the classifier upholds its contract; if
/// they ever do, the turn goes to `CATCH_ALL_HANDLER` rather than failing,
/// so the graph always reaches a terminal handler.
pub fn route(label: IntentLabel) -> HandlerName {
    match label {
        IntentLabel::Resolved(Intent::BillingIssue) => HandlerName::BillingIssue,
        IntentLabel::Resolved(Intent::SimNotWorking) => HandlerName::SimNotWorking,
        IntentLabel::Resolved(Intent::NoNetworkCoverage) => HandlerName::NoNetworkCoverage,
        IntentLabel::Resolved(Intent::InternetSpeedSlow) => HandlerName::InternetSpeedSlow,
        IntentLabel::Resolved(Intent::DataNotWorkingAfterRecharge) => {
            HandlerName::DataNotWorkingAfterRecharge
        }
        IntentLabel::Resolved(Intent::CallDropsFrequently) => HandlerName::CallDropsFrequently,
        // Catch-all: availability over strictness.
        IntentLabel::Unknown | IntentLabel::SystemError => CATCH_ALL_HANDLER,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use callcenter_contracts::intent::{HandlerName, Intent, IntentLabel};

    use super::{route, CATCH_ALL_HANDLER};

    #[test]
    fn each_intent_has_its_own_handler() {
        let routed: HashSet<HandlerName> =
            Intent::ALL.iter().map(|i| route(IntentLabel::Resolved(*i))).collect();
        assert_eq!(routed.len(), 6);
        assert_eq!(routed, HandlerName::ALL.into_iter().collect());
    }

    #[test]
    fn billing_routes_to_billing() {
        assert_eq!(
            route(IntentLabel::Resolved(Intent::BillingIssue)),
            HandlerName::BillingIssue
        );
    }

    #[test]
    fn unresolved_labels_take_the_catch_all() {
        assert_eq!(route(IntentLabel::Unknown), CATCH_ALL_HANDLER);
        assert_eq!(route(IntentLabel::SystemError), CATCH_ALL_HANDLER);
        assert_eq!(CATCH_ALL_HANDLER, HandlerName::CallDropsFrequently);
    }
}
