//! Crawler module for checking links
//!
//! This module contains the core checking logic, including:
//! - HTTP fetching with manual redirect handling
//! - HTML parsing and link extraction
//! - Bounded-concurrency scheduling with delayed retries
//! - Overall run coordination and event publishing

mod engine;
mod events;
mod fetcher;
mod parser;
mod retry;
mod scheduler;

pub use events::CrawlEvent;
pub use fetcher::{
    build_http_client, describe_error, fetch, FetchError, FetchMethod, FetchResponse,
    DEFAULT_USER_AGENT, MAX_REDIRECTS,
};
pub use parser::{extract_fragment_ids, extract_links, ParsedLink};
pub use retry::{error_backoff, parse_retry_after};
pub use scheduler::{CrawlTask, Scheduler};

use crate::config::{validate, CheckOptions};
use crate::output::CheckReport;
use crate::server::{resolve_server_root, LocalServer, ServeOptions};
use crate::url::{is_http_url, LinkMatcher, UrlRewriter};
use crate::Result;
use engine::{CrawlContext, LinkJob};
use events::EventSink;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// A configured link check
///
/// # Example
///
/// ```no_run
/// use ripple_check::{CheckOptions, CrawlEvent, LinkChecker};
///
/// # async fn run() -> ripple_check::Result<()> {
/// let mut checker = LinkChecker::new(CheckOptions::with_paths(["https://example.com/"]));
/// let mut events = checker.subscribe();
///
/// tokio::spawn(async move {
///     while let Some(event) = events.recv().await {
///         if let CrawlEvent::Link(link) = event {
///             println!("[{}] {}", link.state, link.url);
///         }
///     }
/// });
///
/// let report = checker.check().await?;
/// println!("passed: {}", report.passed);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LinkChecker {
    options: CheckOptions,
    events: Option<UnboundedSender<CrawlEvent>>,
}

impl LinkChecker {
    /// Creates a checker for the given options
    pub fn new(options: CheckOptions) -> Self {
        Self {
            options,
            events: None,
        }
    }

    /// Returns a receiver for this checker's events
    ///
    /// Must be called before [`LinkChecker::check`]; a later call replaces
    /// the earlier subscription.
    pub fn subscribe(&mut self) -> UnboundedReceiver<CrawlEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.events = Some(sender);
        receiver
    }

    /// Runs the check to completion
    ///
    /// # Run Flow
    ///
    /// 1. Validate the options
    /// 2. Start the local server when the paths are local
    /// 3. Seed one crawling task per root
    /// 4. Wait for the scheduler to go idle
    /// 5. Stop the local server and build the report
    ///
    /// # Returns
    ///
    /// * `Ok(CheckReport)` - Every link reached a terminal result
    /// * `Err(CheckError)` - The run could not start
    pub async fn check(self) -> Result<CheckReport> {
        let Self { options, events } = self;

        validate(&options)?;
        let matcher = LinkMatcher::new(&options.links_to_skip)?;
        let rewriter = UrlRewriter::new(&options.url_rewrite_expressions)?;
        let client = build_http_client(&options)?;

        let (roots, server) = resolve_roots(&options).await?;
        tracing::info!("Checking {} root(s) with concurrency {}", roots.len(), options.concurrency);

        let ctx = Arc::new(CrawlContext::new(
            options,
            client,
            matcher,
            rewriter,
            EventSink::new(events),
        ));

        for root in roots {
            if !ctx.cache().should_visit(&root) {
                continue;
            }
            let root_path: Arc<str> = Arc::from(root.as_str());
            ctx.enqueue(
                LinkJob {
                    url: root,
                    parent: None,
                    crawl: true,
                    root_path,
                },
                Duration::ZERO,
            );
        }

        ctx.scheduler.on_idle().await;

        if let Some(server) = server {
            server.stop().await;
        }

        let report = CheckReport::from_results(ctx.take_results());
        tracing::info!(
            "Checked {} links (peak {} in flight): {}",
            report.links.len(),
            ctx.scheduler.peak_in_flight(),
            if report.passed { "passed" } else { "failed" }
        );

        Ok(report)
    }
}

/// Checks every link reachable from the configured paths
///
/// Shorthand for `LinkChecker::new(options).check()`.
pub async fn check(options: CheckOptions) -> Result<CheckReport> {
    LinkChecker::new(options).check().await
}

/// Turns the configured paths into root URLs
///
/// Remote paths are used as given. Local paths start a [`LocalServer`]
/// which the caller must stop once the run is idle.
async fn resolve_roots(options: &CheckOptions) -> Result<(Vec<String>, Option<LocalServer>)> {
    if options.paths.iter().all(|p| is_http_url(p)) {
        return Ok((options.paths.clone(), None));
    }

    let root = resolve_server_root(&options.paths, options.server_root.as_deref())?;
    let server = LocalServer::start(
        ServeOptions {
            root,
            markdown: options.markdown,
            directory_listing: options.directory_listing,
        },
        options.port.unwrap_or(0),
    )
    .await?;

    let mut roots = Vec::with_capacity(options.paths.len());
    for path in &options.paths {
        match server.url_for(Path::new(path)) {
            Ok(url) => roots.push(url),
            Err(e) => {
                server.stop().await;
                return Err(e);
            }
        }
    }

    tracing::info!("Serving {} at {}", server.root().display(), server.base_url());
    Ok((roots, Some(server)))
}
