use crate::state::LinkState;
use serde::Serialize;
use std::fmt;

/// One cause recorded against a link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureDetail {
    /// A transport failure: DNS, connect, TLS, timeout, redirect loop
    Error { message: String },

    /// A terminal HTTP response that did not pass
    Response { status: u16, url: String },

    /// A policy verdict (redirects, HTTPS, fragments, status rules)
    Policy { message: String },
}

impl fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error { message } => write!(f, "{}", message),
            Self::Response { status, url } => write!(f, "HTTP {} from {}", status, url),
            Self::Policy { message } => write!(f, "{}", message),
        }
    }
}

/// The outcome of checking one link
///
/// Created once per visited link and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkResult {
    /// The link as requested, after URL rewrites
    pub url: String,

    /// HTTP status, 0 if none was obtained
    pub status: u16,

    /// The verdict
    pub state: LinkState,

    /// The page the link was found on; None for roots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Ordered failure causes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failure_details: Vec<FailureDetail>,
}

impl LinkResult {
    /// Creates a result with no failure details
    pub fn new(url: impl Into<String>, status: u16, state: LinkState, parent: Option<String>) -> Self {
        Self {
            url: url.into(),
            status,
            state,
            parent,
            failure_details: Vec::new(),
        }
    }

    /// Attaches failure details
    pub fn with_failures(mut self, failure_details: Vec<FailureDetail>) -> Self {
        self.failure_details = failure_details;
        self
    }
}

/// Final result of a run
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// Whether no link was broken
    pub passed: bool,

    /// Every result, in completion order
    pub links: Vec<LinkResult>,
}

impl CheckReport {
    /// Builds the report; the run passes iff no result is broken
    pub fn from_results(links: Vec<LinkResult>) -> Self {
        let passed = !links.iter().any(|link| link.state.is_broken());
        Self { passed, links }
    }

    /// Returns the results in the given state
    pub fn by_state(&self, state: LinkState) -> impl Iterator<Item = &LinkResult> {
        self.links.iter().filter(move |link| link.state == state)
    }

    /// Returns the number of results in the given state
    pub fn count(&self, state: LinkState) -> usize {
        self.by_state(state).count()
    }
}
