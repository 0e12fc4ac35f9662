//! URL handling module for Ripple-Check
//!
//! This module provides host extraction for rate-limit bookkeeping, the
//! skip-list matcher, URL rewriting, and the recursion boundary test.

mod domain;
mod matcher;
mod rewrite;

// Re-export main functions
pub use domain::extract_host;
pub use matcher::LinkMatcher;
pub use rewrite::UrlRewriter;

use url::Url;

/// Returns true if the string names an http:// or https:// URL
///
/// # Examples
///
/// ```
/// use ripple_check::url::is_http_url;
///
/// assert!(is_http_url("https://example.com/"));
/// assert!(is_http_url("HTTP://example.com/"));
/// assert!(!is_http_url("mailto:someone@example.com"));
/// assert!(!is_http_url("./docs/index.html"));
/// ```
pub fn is_http_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Decides whether a discovered link lies inside the recursion boundary
///
/// The test is deliberately literal: the link's string form must start with
/// the root path string, and its host must equal the root's host. It is not
/// a path-hierarchy-aware same-origin check, so `https://a.com/doc` also
/// admits `https://a.com/docs-old/`.
///
/// # Arguments
///
/// * `link` - The resolved child URL
/// * `root_path` - The root path the run started from
///
/// # Returns
///
/// * `true` - If the child should itself be crawled for links
/// * `false` - Otherwise
pub fn is_within_root(link: &Url, root_path: &str) -> bool {
    if !link.as_str().starts_with(root_path) {
        return false;
    }

    match Url::parse(root_path) {
        Ok(root) => root.host_str() == link.host_str(),
        Err(_) => false,
    }
}
