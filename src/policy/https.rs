use crate::config::HttpsMode;
use url::Url;

/// Outcome of the HTTPS-requirement policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpsOutcome {
    /// Nothing to report
    Pass,
    /// Report the link as insecure, keep the verdict
    Warn,
    /// Force the link broken with this message
    Fail(String),
}

/// Evaluates the HTTPS requirement for a requested URL
///
/// Only plain `http://` URLs are affected.
pub fn evaluate_https(url: &Url, mode: HttpsMode) -> HttpsOutcome {
    if url.scheme() != "http" {
        return HttpsOutcome::Pass;
    }

    match mode {
        HttpsMode::Off => HttpsOutcome::Pass,
        HttpsMode::Warn => HttpsOutcome::Warn,
        HttpsMode::Error => HttpsOutcome::Fail(format!(
            "HTTPS is required but {} uses plain HTTP",
            url
        )),
    }
}
