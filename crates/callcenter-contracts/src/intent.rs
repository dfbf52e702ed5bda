//! Closed label sets: canonical intents, handler names, and action labels.
//!
//! Intents and action labels cross the language-model boundary as plain
//! strings. They are parsed into these enums exactly once, at that boundary,
//! so every other component can rely on exhaustive matching.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CallcenterError, CallcenterResult};

// ── Intent ────────────────────────────────────────────────────────────────────

/// One of the six canonical intents a call turn can be classified into.
///
/// The set is fixed and closed. Serialized form is the human-readable label
/// (e.g. `"Billing Issue"`), which is also what the classifier prompt uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Intent {
    #[serde(rename = "Billing Issue")]
    BillingIssue,
    #[serde(rename = "SIM Not Working")]
    SimNotWorking,
    #[serde(rename = "No Network Coverage")]
    NoNetworkCoverage,
    #[serde(rename = "Internet Speed Slow")]
    InternetSpeedSlow,
    #[serde(rename = "Data Not Working After Recharge")]
    DataNotWorkingAfterRecharge,
    #[serde(rename = "Call Drops Frequently")]
    CallDropsFrequently,
}

impl Intent {
    /// All canonical intents in enumeration order.
    ///
    /// This order is significant: the keyword fallback breaks score ties by
    /// position in this array.
    pub const ALL: [Intent; 6] = [
        Intent::BillingIssue,
        Intent::SimNotWorking,
        Intent::NoNetworkCoverage,
        Intent::InternetSpeedSlow,
        Intent::DataNotWorkingAfterRecharge,
        Intent::CallDropsFrequently,
    ];

    /// The canonical label, exactly as exchanged with the language model.
    pub fn label(self) -> &'static str {
        match self {
            Intent::BillingIssue => "Billing Issue",
            Intent::SimNotWorking => "SIM Not Working",
            Intent::NoNetworkCoverage => "No Network Coverage",
            Intent::InternetSpeedSlow => "Internet Speed Slow",
            Intent::DataNotWorkingAfterRecharge => "Data Not Working After Recharge",
            Intent::CallDropsFrequently => "Call Drops Frequently",
        }
    }

    /// The closed set of internal action labels a handler for this intent
    /// may emit.
    pub fn action_labels(self) -> &'static [ActionLabel] {
        use ActionLabel::*;
        match self {
            Intent::BillingIssue => &[
                AdjustBill,
                OpenBillingTicket,
                EscalateToBilling,
                InformNoIssueFound,
                RequestDocs,
            ],
            Intent::SimNotWorking => &[
                RemoteProvision,
                ScheduleSimReplacement,
                TicketDeviceCheck,
                InformUserNoIssueDetected,
            ],
            Intent::NoNetworkCoverage => {
                &[CreateNetworkTicket, AdviseRoaming, CheckProvisioning, NoAction]
            }
            Intent::InternetSpeedSlow => {
                &[AutomatedReset, CreateSpeedTicket, AdvisePlanUpgrade, NoAction]
            }
            Intent::DataNotWorkingAfterRecharge => {
                &[ReprovisionData, RefundIfFailed, OpenTicket, NoAction]
            }
            Intent::CallDropsFrequently => &[
                CreateNetworkInvestigation,
                ScheduleFieldCheck,
                CheckProvisioning,
                NoAction,
            ],
        }
    }

    /// Return true if `action` belongs to this intent's action-label set.
    pub fn permits_action(self, action: ActionLabel) -> bool {
        self.action_labels().contains(&action)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Intent {
    type Err = CallcenterError;

    /// Parse a canonical label. Surrounding whitespace is ignored; anything
    /// else must match a canonical label exactly.
    fn from_str(s: &str) -> CallcenterResult<Self> {
        let trimmed = s.trim();
        Intent::ALL
            .into_iter()
            .find(|intent| intent.label() == trimmed)
            .ok_or_else(|| CallcenterError::InvalidLabel {
                kind: "intent",
                label: s.to_string(),
            })
    }
}

// ── IntentLabel ───────────────────────────────────────────────────────────────

/// The value of `CallState::intent` across the lifetime of a turn.
///
/// - `Unknown` before classification runs (serialized `"Unknown"`)
/// - `Resolved` after classification (serialized as the canonical label)
/// - `SystemError` when the turn degraded to the system-error script
///   (serialized `"error"`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum IntentLabel {
    #[default]
    Unknown,
    Resolved(Intent),
    SystemError,
}

impl IntentLabel {
    pub const UNKNOWN: &'static str = "Unknown";
    pub const SYSTEM_ERROR: &'static str = "error";

    /// The resolved canonical intent, if classification has run.
    pub fn intent(self) -> Option<Intent> {
        match self {
            IntentLabel::Resolved(intent) => Some(intent),
            IntentLabel::Unknown | IntentLabel::SystemError => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IntentLabel::Unknown => Self::UNKNOWN,
            IntentLabel::Resolved(intent) => intent.label(),
            IntentLabel::SystemError => Self::SYSTEM_ERROR,
        }
    }
}

impl From<Intent> for IntentLabel {
    fn from(intent: Intent) -> Self {
        IntentLabel::Resolved(intent)
    }
}

impl From<IntentLabel> for String {
    fn from(label: IntentLabel) -> Self {
        label.as_str().to_string()
    }
}

impl TryFrom<String> for IntentLabel {
    type Error = CallcenterError;

    fn try_from(value: String) -> Result<IntentLabel, CallcenterError> {
        match value.trim() {
            "" | IntentLabel::UNKNOWN => Ok(IntentLabel::Unknown),
            IntentLabel::SYSTEM_ERROR => Ok(IntentLabel::SystemError),
            other => other.parse::<Intent>().map(IntentLabel::Resolved),
        }
    }
}

impl fmt::Display for IntentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── HandlerName ───────────────────────────────────────────────────────────────

/// Name of one of the six leaf handlers of the call graph.
///
/// The router maps an `IntentLabel` to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerName {
    BillingIssue,
    SimNotWorking,
    NoNetworkCoverage,
    InternetSpeedSlow,
    DataNotWorkingAfterRecharge,
    CallDropsFrequently,
}

impl HandlerName {
    pub const ALL: [HandlerName; 6] = [
        HandlerName::BillingIssue,
        HandlerName::SimNotWorking,
        HandlerName::NoNetworkCoverage,
        HandlerName::InternetSpeedSlow,
        HandlerName::DataNotWorkingAfterRecharge,
        HandlerName::CallDropsFrequently,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HandlerName::BillingIssue => "billing_issue_handler",
            HandlerName::SimNotWorking => "sim_not_working_handler",
            HandlerName::NoNetworkCoverage => "no_network_coverage_handler",
            HandlerName::InternetSpeedSlow => "internet_speed_slow_handler",
            HandlerName::DataNotWorkingAfterRecharge => "data_not_working_after_recharge_handler",
            HandlerName::CallDropsFrequently => "call_drops_frequently_handler",
        }
    }
}

impl fmt::Display for HandlerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ActionLabel ───────────────────────────────────────────────────────────────

/// Internal action label a handler attaches to its script.
///
/// The union of every handler's permitted labels. Which subset is legal for a
/// given intent is answered by `Intent::action_labels`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionLabel {
    AdjustBill,
    OpenBillingTicket,
    EscalateToBilling,
    InformNoIssueFound,
    RequestDocs,
    RemoteProvision,
    ScheduleSimReplacement,
    TicketDeviceCheck,
    InformUserNoIssueDetected,
    CreateNetworkTicket,
    AdviseRoaming,
    CheckProvisioning,
    NoAction,
    AutomatedReset,
    CreateSpeedTicket,
    AdvisePlanUpgrade,
    ReprovisionData,
    RefundIfFailed,
    OpenTicket,
    CreateNetworkInvestigation,
    ScheduleFieldCheck,
}

impl ActionLabel {
    pub const ALL: [ActionLabel; 21] = [
        ActionLabel::AdjustBill,
        ActionLabel::OpenBillingTicket,
        ActionLabel::EscalateToBilling,
        ActionLabel::InformNoIssueFound,
        ActionLabel::RequestDocs,
        ActionLabel::RemoteProvision,
        ActionLabel::ScheduleSimReplacement,
        ActionLabel::TicketDeviceCheck,
        ActionLabel::InformUserNoIssueDetected,
        ActionLabel::CreateNetworkTicket,
        ActionLabel::AdviseRoaming,
        ActionLabel::CheckProvisioning,
        ActionLabel::NoAction,
        ActionLabel::AutomatedReset,
        ActionLabel::CreateSpeedTicket,
        ActionLabel::AdvisePlanUpgrade,
        ActionLabel::ReprovisionData,
        ActionLabel::RefundIfFailed,
        ActionLabel::OpenTicket,
        ActionLabel::CreateNetworkInvestigation,
        ActionLabel::ScheduleFieldCheck,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionLabel::AdjustBill => "adjust-bill",
            ActionLabel::OpenBillingTicket => "open-billing-ticket",
            ActionLabel::EscalateToBilling => "escalate-to-billing",
            ActionLabel::InformNoIssueFound => "inform-no-issue-found",
            ActionLabel::RequestDocs => "request-docs",
            ActionLabel::RemoteProvision => "remote-provision",
            ActionLabel::ScheduleSimReplacement => "schedule-sim-replacement",
            ActionLabel::TicketDeviceCheck => "ticket-device-check",
            ActionLabel::InformUserNoIssueDetected => "inform-user-no-issue-detected",
            ActionLabel::CreateNetworkTicket => "create-network-ticket",
            ActionLabel::AdviseRoaming => "advise-roaming",
            ActionLabel::CheckProvisioning => "check-provisioning",
            ActionLabel::NoAction => "no-action",
            ActionLabel::AutomatedReset => "automated-reset",
            ActionLabel::CreateSpeedTicket => "create-speed-ticket",
            ActionLabel::AdvisePlanUpgrade => "advise-plan-upgrade",
            ActionLabel::ReprovisionData => "reprovision-data",
            ActionLabel::RefundIfFailed => "refund-if-failed",
            ActionLabel::OpenTicket => "open-ticket",
            ActionLabel::CreateNetworkInvestigation => "create-network-investigation",
            ActionLabel::ScheduleFieldCheck => "schedule-field-check",
        }
    }
}

impl fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionLabel {
    type Err = CallcenterError;

    /// Parse a kebab-case action label. Quotes, surrounding whitespace and
    /// letter case are ignored, since generated text is not always tidy.
    fn from_str(s: &str) -> CallcenterResult<Self> {
        let normalized = s
            .trim()
            .trim_matches(|c| c == '"' || c == '\'' || c == '`')
            .to_ascii_lowercase();
        ActionLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == normalized)
            .ok_or_else(|| CallcenterError::InvalidLabel {
                kind: "action",
                label: s.to_string(),
            })
    }
}
