use crate::config::StatusAction;
use crate::state::LinkState;
use std::collections::BTreeMap;

/// Finds the rule that applies to a status code
///
/// An exact key ("404") wins over a class key ("4xx"). Returns None when no
/// rule matches.
pub fn resolve_action(status: u16, rules: &BTreeMap<String, StatusAction>) -> Option<StatusAction> {
    let exact = status.to_string();
    if let Some(action) = rules.get(&exact) {
        return Some(*action);
    }

    let class = format!("{}xx", status / 100);
    rules.get(&class).copied()
}

/// Outcome of the status-code policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusVerdict {
    /// Provisional state for the link
    pub state: LinkState,

    /// Whether a warning should be emitted for the status
    pub warn: bool,
}

/// Maps an HTTP status to a provisional verdict
///
/// Without a matching rule, 2xx is OK and everything else (including 0 for
/// "no response") is broken.
pub fn evaluate_status(status: u16, rules: &BTreeMap<String, StatusAction>) -> StatusVerdict {
    let action = if status == 0 {
        None
    } else {
        resolve_action(status, rules)
    };

    match action {
        Some(StatusAction::Ok) => StatusVerdict {
            state: LinkState::Ok,
            warn: false,
        },
        Some(StatusAction::Warn) => StatusVerdict {
            state: LinkState::Ok,
            warn: true,
        },
        Some(StatusAction::Skip) => StatusVerdict {
            state: LinkState::Skipped,
            warn: false,
        },
        Some(StatusAction::Error) => StatusVerdict {
            state: LinkState::Broken,
            warn: false,
        },
        None if (200..300).contains(&status) => StatusVerdict {
            state: LinkState::Ok,
            warn: false,
        },
        None => StatusVerdict {
            state: LinkState::Broken,
            warn: false,
        },
    }
}
