use crate::config::RedirectMode;

/// What the fetcher observed about a redirect chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectInfo {
    /// Status of the first 3xx response
    pub status: u16,

    /// Where the chain ended up (or pointed, when not followed)
    pub target: String,

    /// Some 3xx hop carried a body, which ordinary clients would not follow
    pub non_standard: bool,
}

/// Outcome of the redirect policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// No redirect, or redirects allowed
    Pass,
    /// Report the redirect, keep the verdict
    Warn,
    /// Force the link broken, reporting the original 3xx status
    Fail { status: u16, message: String },
}

/// Evaluates the redirect policy for a requested URL
///
/// Applies only when a redirect was observed.
pub fn evaluate_redirect(url: &str, redirect: Option<&RedirectInfo>, mode: RedirectMode) -> RedirectOutcome {
    let Some(redirect) = redirect else {
        return RedirectOutcome::Pass;
    };

    match mode {
        RedirectMode::Allow => RedirectOutcome::Pass,
        RedirectMode::Warn => RedirectOutcome::Warn,
        RedirectMode::Error => RedirectOutcome::Fail {
            status: redirect.status,
            message: format!(
                "Redirect from {} to {} detected (redirects are disabled)",
                url, redirect.target
            ),
        },
    }
}
