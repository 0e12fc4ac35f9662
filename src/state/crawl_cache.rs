use std::collections::{HashMap, HashSet};

/// Per-run bookkeeping shared by every link check in a run
///
/// This structure holds the dedup set that guarantees each resolved URL is
/// enqueued once, plus the two delay maps the retry policies consult:
/// a per-host rate-limit deadline and a per-URL error-retry counter.
///
/// It is owned by the run's context behind a mutex; every method is a short,
/// non-suspending critical section.
#[derive(Debug, Clone, Default)]
pub struct CrawlCache {
    /// Resolved URLs already enqueued in this run
    seen: HashSet<String>,

    /// Host -> epoch milliseconds before which no request may be issued
    host_delays: HashMap<String, i64>,

    /// URL -> number of error retries attempted so far
    error_attempts: HashMap<String, u32>,
}

impl CrawlCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a URL as seen, returning true only on the first sighting
    ///
    /// The check and the mark happen in one call so two tasks racing on the
    /// same URL can never both enqueue it.
    pub fn should_visit(&mut self, url: &str) -> bool {
        self.seen.insert(url.to_string())
    }

    /// Returns whether a URL has already been enqueued
    pub fn has_seen(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Returns the number of distinct URLs enqueued so far
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Stores a rate-limit deadline for a host, keeping the later of the two
    pub fn record_host_delay(&mut self, host: &str, until_ms: i64) {
        let entry = self.host_delays.entry(host.to_string()).or_insert(until_ms);
        if until_ms > *entry {
            *entry = until_ms;
        }
    }

    /// Returns the current rate-limit deadline for a host, if any
    pub fn host_delay(&self, host: &str) -> Option<i64> {
        self.host_delays.get(host).copied()
    }

    /// Returns how long a request to `host` must still wait at `now_ms`
    ///
    /// Returns None once the deadline has passed.
    pub fn pending_delay_ms(&self, host: &str, now_ms: i64) -> Option<u64> {
        self.host_delay(host)
            .filter(|until| *until > now_ms)
            .map(|until| (until - now_ms) as u64)
    }

    /// Increments and returns the error-retry attempt count for a URL
    ///
    /// The first call for a URL returns 1.
    pub fn increment_error_attempt(&mut self, url: &str) -> u32 {
        let attempts = self.error_attempts.entry(url.to_string()).or_insert(0);
        *attempts += 1;
        *attempts
    }
}
