//! Retry timing
//!
//! Two independent mechanisms share this module: honouring `retry-after` on
//! HTTP 429, and exponential back-off for 5xx responses and network errors.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;
use std::time::Duration;

/// Parses a `retry-after` header value into an absolute deadline
///
/// Accepts a non-negative number of seconds or an HTTP date.
///
/// # Returns
///
/// * `Some(DateTime<Utc>)` - When the request may be retried
/// * `None` - The value is neither form, or the deadline is past the
///   representable range; the 429 is treated as final
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(seconds) = value.parse::<f64>() {
        if !seconds.is_finite() || seconds < 0.0 {
            return None;
        }
        // Saturates to i64::MAX for absurd values; the add below rejects those
        let millis = (seconds * 1000.0).round().min(i64::MAX as f64) as i64;
        return now.checked_add_signed(ChronoDuration::milliseconds(millis));
    }

    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Returns how long to wait before error retry number `attempt`
///
/// The wait is `2^attempt` seconds plus a uniformly random jitter in
/// `0..=jitter_ms` milliseconds.
pub fn error_backoff(attempt: u32, jitter_ms: u64) -> Duration {
    let jitter = if jitter_ms == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..=jitter_ms)
    };

    Duration::from_millis(backoff_base_ms(attempt).saturating_add(jitter))
}

fn backoff_base_ms(attempt: u32) -> u64 {
    2u64.checked_pow(attempt)
        .and_then(|factor| factor.checked_mul(1000))
        .unwrap_or(u64::MAX)
}

/// Rounds a wait to whole seconds for reporting
pub fn seconds_until(wait: Duration) -> u64 {
    (wait.as_millis() as u64 + 500) / 1000
}
