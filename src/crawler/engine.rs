//! Per-link processing
//!
//! Every link of a run goes through [`CrawlContext::check_link`]:
//!
//! 1. Apply URL rewrites
//! 2. Skip non-HTTP schemes and links on the skip list
//! 3. Wait out any rate-limit deadline recorded for the host
//! 4. Fetch (HEAD where possible, GET when a body is needed)
//! 5. Honour 429 `retry-after` and back off on errors when enabled
//! 6. Classify through the policy pipeline and record the result
//! 7. Scan crawlable HTML pages for more links

use crate::config::{CheckOptions, RedirectMode};
use crate::crawler::events::{CrawlEvent, EventSink};
use crate::crawler::fetcher::{fetch, FetchMethod, FetchResponse};
use crate::crawler::parser::{extract_fragment_ids, extract_links, ParsedLink};
use crate::crawler::retry::{error_backoff, parse_retry_after, seconds_until};
use crate::crawler::scheduler::{panic_message, CrawlTask, Scheduler};
use crate::output::{FailureDetail, LinkResult};
use crate::policy::{classify, ClassifyInput};
use crate::state::{CrawlCache, LinkState};
use crate::url::{extract_host, is_within_root, LinkMatcher, UrlRewriter};
use chrono::Utc;
use futures::FutureExt;
use reqwest::Client;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use url::Url;

/// One link waiting to be checked
#[derive(Debug, Clone)]
pub(crate) struct LinkJob {
    /// The URL as discovered, before rewrites
    pub url: String,

    /// Page the link was found on
    pub parent: Option<String>,

    /// Whether the page should be scanned for further links
    pub crawl: bool,

    /// Root this link descends from; bounds recursion
    pub root_path: Arc<str>,
}

/// State shared by every task of one run
pub(crate) struct CrawlContext {
    pub options: CheckOptions,
    pub client: Client,
    pub scheduler: Scheduler,
    pub matcher: LinkMatcher,
    pub rewriter: UrlRewriter,
    pub events: EventSink,
    cache: Mutex<CrawlCache>,
    results: Mutex<Vec<LinkResult>>,
}

impl CrawlContext {
    pub fn new(
        options: CheckOptions,
        client: Client,
        matcher: LinkMatcher,
        rewriter: UrlRewriter,
        events: EventSink,
    ) -> Self {
        let scheduler = Scheduler::new(options.concurrency);

        Self {
            options,
            client,
            scheduler,
            matcher,
            rewriter,
            events,
            cache: Mutex::new(CrawlCache::new()),
            results: Mutex::new(Vec::new()),
        }
    }

    pub fn cache(&self) -> MutexGuard<'_, CrawlCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn results(&self) -> MutexGuard<'_, Vec<LinkResult>> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes and returns every result recorded so far
    pub fn take_results(&self) -> Vec<LinkResult> {
        std::mem::take(&mut *self.results())
    }

    /// Queues a link check to start after `delay`
    pub fn enqueue(self: &Arc<Self>, job: LinkJob, delay: Duration) {
        self.scheduler.add(self.task(job), delay);
    }

    /// Wraps a check so a panic still leaves the link with a BROKEN result
    fn task(self: &Arc<Self>, job: LinkJob) -> CrawlTask {
        let ctx = Arc::clone(self);

        async move {
            let url = job.url.clone();
            let parent = job.parent.clone();
            let recorded = AtomicBool::new(false);

            let outcome = AssertUnwindSafe(Arc::clone(&ctx).check_link(job, &recorded))
                .catch_unwind()
                .await;

            if let Err(panic) = outcome {
                let message = panic_message(&*panic);
                tracing::error!("Checking {} panicked: {}", url, message);

                if !recorded.load(Ordering::SeqCst) {
                    ctx.record(
                        LinkResult::new(ctx.rewriter.apply(&url), 0, LinkState::Broken, parent)
                            .with_failures(vec![FailureDetail::Error {
                                message: format!("Internal error: {}", message),
                            }]),
                    );
                }
            }
        }
        .boxed()
    }

    fn record(&self, result: LinkResult) {
        tracing::debug!("[{}] {} {}", result.state, result.status, result.url);
        // Emit under the lock so events arrive in result order
        let mut results = self.results();
        results.push(result.clone());
        self.events.emit(CrawlEvent::Link(result));
    }

    /// Records the job's own result and marks it as recorded
    fn record_terminal(&self, result: LinkResult, recorded: &AtomicBool) {
        self.record(result);
        recorded.store(true, Ordering::SeqCst);
    }

    /// Checks one link, recording exactly one result unless it is re-queued
    pub async fn check_link(self: Arc<Self>, job: LinkJob, recorded: &AtomicBool) {
        let rewritten = self.rewriter.apply(&job.url);

        let url = match Url::parse(&rewritten) {
            Ok(url) => url,
            Err(e) => {
                self.record_terminal(
                    LinkResult::new(rewritten, 0, LinkState::Broken, job.parent.clone()).with_failures(
                        vec![FailureDetail::Error {
                            message: format!("Invalid URL: {}", e),
                        }],
                    ),
                    recorded,
                );
                return;
            }
        };

        if !matches!(url.scheme(), "http" | "https") || self.matcher.is_skipped(url.as_str()) {
            self.record_terminal(
                LinkResult::new(url.as_str(), 0, LinkState::Skipped, job.parent.clone()),
                recorded,
            );
            return;
        }

        let host = extract_host(&url).unwrap_or_default();
        let now_ms = Utc::now().timestamp_millis();
        let pending = self.cache().pending_delay_ms(&host, now_ms);
        if let Some(wait_ms) = pending {
            tracing::debug!("Host {} is rate limited, delaying {} by {}ms", host, url, wait_ms);
            self.enqueue(job, Duration::from_millis(wait_ms));
            return;
        }

        let has_fragment = url.fragment().map_or(false, |f| !f.is_empty());
        let read_body = job.crawl || (self.options.check_fragments && has_fragment);
        let follow = self.options.redirects != RedirectMode::Error;
        let mut failures = Vec::new();
        let mut response: Option<FetchResponse> = None;

        let first_method = if read_body {
            FetchMethod::Get
        } else {
            FetchMethod::Head
        };

        match fetch(&self.client, &url, first_method, follow, read_body).await {
            Ok(first) => {
                if self.retry_after_rate_limit(&first, &job, &url, &host) {
                    return;
                }
                let head_refused = first.status == 405 && first.method == FetchMethod::Head;
                response = Some(first);

                if head_refused {
                    match fetch(&self.client, &url, FetchMethod::Get, follow, false).await {
                        Ok(second) => {
                            if self.retry_after_rate_limit(&second, &job, &url, &host) {
                                return;
                            }
                            response = Some(second);
                        }
                        Err(e) => failures.push(FailureDetail::Error {
                            message: e.to_string(),
                        }),
                    }
                }
            }
            Err(e) => failures.push(FailureDetail::Error {
                message: e.to_string(),
            }),
        }

        // Some servers answer HEAD badly; give leaf links one plain GET
        if !job.crawl && !response.as_ref().map_or(false, FetchResponse::is_success) {
            match fetch(&self.client, &url, FetchMethod::Get, follow, read_body).await {
                Ok(fallback) => {
                    if self.retry_after_rate_limit(&fallback, &job, &url, &host) {
                        return;
                    }
                    response = Some(fallback);
                }
                Err(e) => failures.push(FailureDetail::Error {
                    message: e.to_string(),
                }),
            }
        }

        let status = response.as_ref().map_or(0, |r| r.status);

        if self.options.retry_errors && (status == 0 || status >= 500) {
            let attempt = self.cache().increment_error_attempt(url.as_str());
            if attempt <= self.options.retry_errors_count {
                let wait = error_backoff(attempt, self.options.retry_errors_jitter);
                tracing::debug!("Retrying {} (attempt {}) in {:?}", url, attempt, wait);
                self.events.emit(CrawlEvent::Retry {
                    url: url.to_string(),
                    status,
                    seconds_until_retry: seconds_until(wait),
                });
                self.enqueue(job, wait);
                return;
            }
        }

        let anchors = match &response {
            Some(r) if self.options.check_fragments && has_fragment && r.is_html() => {
                r.body.as_deref().map(extract_fragment_ids)
            }
            _ => None,
        };

        let final_url = response.as_ref().map(|r| r.final_url.to_string());
        let verdict = classify(
            ClassifyInput {
                url: &url,
                status,
                final_url: final_url.as_deref(),
                redirect: response.as_ref().and_then(|r| r.redirect.as_ref()),
                anchors: anchors.as_ref(),
            },
            &self.options,
            failures,
        );

        for event in verdict.events {
            self.events.emit(event);
        }

        self.record_terminal(
            LinkResult::new(url.as_str(), verdict.status, verdict.state, job.parent.clone())
                .with_failures(verdict.failures),
            recorded,
        );

        if !job.crawl {
            return;
        }

        if let Some(page) = response {
            if page.method == FetchMethod::Get && page.is_html() {
                if let Some(body) = page.body {
                    self.scan_page(&job, &url, page.final_url, body).await;
                }
            }
        }
    }

    /// Handles a 429 carrying `retry-after` when retries are enabled
    ///
    /// Returns true when the job was re-queued and must not be recorded.
    fn retry_after_rate_limit(
        self: &Arc<Self>,
        response: &FetchResponse,
        job: &LinkJob,
        url: &Url,
        host: &str,
    ) -> bool {
        if !self.options.retry || response.status != 429 {
            return false;
        }

        let now = Utc::now();
        let Some(deadline) = response
            .retry_after
            .as_deref()
            .and_then(|value| parse_retry_after(value, now))
        else {
            return false;
        };

        let until_ms = deadline.timestamp_millis();
        self.cache().record_host_delay(host, until_ms);

        let wait = Duration::from_millis((until_ms - now.timestamp_millis()).max(0) as u64);
        tracing::info!("Rate limited by {}, retrying {} in {:?}", host, url, wait);
        self.events.emit(CrawlEvent::Retry {
            url: url.to_string(),
            status: 429,
            seconds_until_retry: seconds_until(wait),
        });

        self.enqueue(job.clone(), wait);
        true
    }

    /// Enqueues every new link found on a crawled page
    async fn scan_page(self: &Arc<Self>, job: &LinkJob, page_url: &Url, base: Url, body: String) {
        self.events.emit(CrawlEvent::PageStart {
            url: page_url.to_string(),
        });

        let links = match tokio::task::spawn_blocking(move || extract_links(&body, &base)).await {
            Ok(links) => links,
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", page_url, e);
                return;
            }
        };

        let parent = page_url.to_string();
        let mut found = HashSet::new();

        for ParsedLink { original, resolved } in links {
            if !self.options.check_fragments && original.starts_with('#') {
                continue;
            }

            let Some(resolved) = resolved else {
                self.record(
                    LinkResult::new(original, 0, LinkState::Broken, Some(parent.clone())).with_failures(
                        vec![FailureDetail::Error {
                            message: "Unable to resolve link".to_string(),
                        }],
                    ),
                );
                continue;
            };

            if !found.insert(resolved.to_string()) {
                continue;
            }

            let crawl = self.options.recurse && is_within_root(&resolved, &job.root_path);
            if self.cache().should_visit(resolved.as_str()) {
                self.enqueue(
                    LinkJob {
                        url: resolved.to_string(),
                        parent: Some(parent.clone()),
                        crawl,
                        root_path: Arc::clone(&job.root_path),
                    },
                    Duration::ZERO,
                );
            }
        }

        tracing::debug!("Found {} distinct links on {}", found.len(), page_url);
    }
}
