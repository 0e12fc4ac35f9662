/// Link state definitions for check results
///
/// Every checked link ends in exactly one of these states.
use serde::Serialize;
use std::fmt;

/// The verdict recorded for a checked link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LinkState {
    /// The link resolved successfully (or a status rule forced it to pass)
    Ok,

    /// The link is broken: transport failure, bad status, or a failed policy
    Broken,

    /// The link was deliberately not checked (scheme, skip list, status rule)
    Skipped,
}

impl LinkState {
    /// Returns true if this state fails the run
    pub fn is_broken(&self) -> bool {
        matches!(self, Self::Broken)
    }

    /// Returns true if the link was not checked
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// Returns the upper-case label used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Broken => "BROKEN",
            Self::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
