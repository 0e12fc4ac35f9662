//! Events published while a check runs
//!
//! Callers subscribe with [`crate::LinkChecker::subscribe`] before starting a
//! run. Events arrive in completion order; there is no total order across
//! distinct links.

use crate::output::LinkResult;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// Something observable that happened during a check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CrawlEvent {
    /// A link reached its terminal result
    Link(LinkResult),

    /// A page is about to be scanned for child links
    PageStart { url: String },

    /// A link will be requested again later
    Retry {
        url: String,
        status: u16,
        seconds_until_retry: u64,
    },

    /// A redirect was followed while redirects are in warn mode
    Redirect {
        url: String,
        status: u16,
        target_url: String,
        non_standard: bool,
    },

    /// A plain-HTTP link was seen while HTTPS is in warn mode
    HttpInsecure { url: String },

    /// A status code rule with the `warn` action matched
    StatusCodeWarning { url: String, status: u16 },
}

/// Fan-out point for events; a no-op when nobody subscribed
#[derive(Debug, Clone, Default)]
pub(crate) struct EventSink {
    sender: Option<UnboundedSender<CrawlEvent>>,
}

impl EventSink {
    pub(crate) fn new(sender: Option<UnboundedSender<CrawlEvent>>) -> Self {
        Self { sender }
    }

    /// Publishes an event; a dropped receiver is not an error
    pub(crate) fn emit(&self, event: CrawlEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}
