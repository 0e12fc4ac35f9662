//! Policy evaluators for classifying a fetched link
//!
//! Each evaluator is a pure function over the response and the run options.
//! [`classify`] runs them as an ordered pipeline over a [`Verdict`]: status
//! codes, then HTTPS, then redirects, then fragments. A stage may downgrade
//! OK to BROKEN but never upgrade, so the first stage to break a link wins
//! while later stages still get to emit their warnings.

mod fragment;
mod https;
mod redirect;
mod status_codes;

pub use fragment::check_fragment;
pub use https::{evaluate_https, HttpsOutcome};
pub use redirect::{evaluate_redirect, RedirectInfo, RedirectOutcome};
pub use status_codes::{evaluate_status, resolve_action, StatusVerdict};

use crate::config::CheckOptions;
use crate::crawler::CrawlEvent;
use crate::output::FailureDetail;
use crate::state::LinkState;
use std::collections::HashSet;
use url::Url;

/// What the pipeline needs to know about a fetch
#[derive(Debug, Clone, Copy)]
pub struct ClassifyInput<'a> {
    /// The URL as requested, after rewrites
    pub url: &'a Url,

    /// Final HTTP status, 0 if no response was obtained
    pub status: u16,

    /// URL the final response came from
    pub final_url: Option<&'a str>,

    /// Redirect observed while fetching, if any
    pub redirect: Option<&'a RedirectInfo>,

    /// Anchors of the target page; set only when an HTML body was fetched
    pub anchors: Option<&'a HashSet<String>>,
}

/// The verdict carried through the policy pipeline
#[derive(Debug, Clone)]
pub struct Verdict {
    /// Current state
    pub state: LinkState,

    /// Status to report
    pub status: u16,

    /// Ordered failure causes
    pub failures: Vec<FailureDetail>,

    /// Warnings raised by the policies
    pub events: Vec<CrawlEvent>,
}

impl Verdict {
    /// Breaks an OK or already-broken link, recording why
    ///
    /// Skipped links stay skipped. Returns whether the detail was recorded.
    fn force_broken(&mut self, detail: FailureDetail) -> bool {
        if self.state.is_skipped() {
            return false;
        }
        self.state = LinkState::Broken;
        self.failures.push(detail);
        true
    }
}

/// Runs every policy over a fetch outcome
///
/// # Arguments
///
/// * `input` - The observed fetch outcome
/// * `options` - The run options
/// * `failures` - Transport failures recorded while fetching
pub fn classify(input: ClassifyInput<'_>, options: &CheckOptions, failures: Vec<FailureDetail>) -> Verdict {
    let url = input.url.as_str().to_string();

    // Status codes
    let status_verdict = evaluate_status(input.status, &options.status_codes);
    let mut verdict = Verdict {
        state: status_verdict.state,
        status: input.status,
        failures,
        events: Vec::new(),
    };

    if status_verdict.warn {
        verdict.events.push(CrawlEvent::StatusCodeWarning {
            url: url.clone(),
            status: input.status,
        });
    }

    if verdict.state.is_broken() && input.status != 0 {
        verdict.failures.push(FailureDetail::Response {
            status: input.status,
            url: input.final_url.unwrap_or(&url).to_string(),
        });
    }

    // HTTPS requirement
    match evaluate_https(input.url, options.require_https) {
        HttpsOutcome::Pass => {}
        HttpsOutcome::Warn => verdict.events.push(CrawlEvent::HttpInsecure { url: url.clone() }),
        HttpsOutcome::Fail(message) => {
            verdict.force_broken(FailureDetail::Policy { message });
        }
    }

    // Redirects
    match evaluate_redirect(&url, input.redirect, options.redirects) {
        RedirectOutcome::Pass => {}
        RedirectOutcome::Warn => {
            if let Some(redirect) = input.redirect {
                verdict.events.push(CrawlEvent::Redirect {
                    url: url.clone(),
                    status: input.status,
                    target_url: redirect.target.clone(),
                    non_standard: redirect.non_standard,
                });
            }
        }
        RedirectOutcome::Fail { status, message } => {
            if verdict.force_broken(FailureDetail::Policy { message }) {
                verdict.status = status;
            }
        }
    }

    // Fragments
    if options.check_fragments && verdict.state == LinkState::Ok {
        if let (Some(fragment), Some(anchors)) = (input.url.fragment(), input.anchors) {
            if let Some(message) = check_fragment(fragment, anchors) {
                verdict.force_broken(FailureDetail::Policy { message });
            }
        }
    }

    verdict
}
