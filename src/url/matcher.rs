use crate::config::{LinksToSkip, SkipPredicate};
use crate::ConfigError;
use regex::Regex;

/// Compiled form of the skip list
///
/// Patterns are compiled once per run; a predicate is called as-is.
#[derive(Clone)]
pub enum LinkMatcher {
    /// Any pattern matching the URL skips it
    Patterns(Vec<Regex>),

    /// Caller predicate; true skips the URL
    Predicate(SkipPredicate),
}

impl LinkMatcher {
    /// Compiles the configured skip list
    ///
    /// # Returns
    ///
    /// * `Ok(LinkMatcher)` - Ready-to-use matcher
    /// * `Err(ConfigError)` - A pattern failed to compile
    pub fn new(skip: &LinksToSkip) -> Result<Self, ConfigError> {
        match skip {
            LinksToSkip::Patterns(patterns) => {
                let compiled = patterns
                    .iter()
                    .map(|p| crate::config::compile_pattern(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Patterns(compiled))
            }
            LinksToSkip::Predicate(predicate) => Ok(Self::Predicate(predicate.clone())),
        }
    }

    /// Returns true if the URL should be skipped without a request
    ///
    /// # Examples
    ///
    /// ```
    /// use ripple_check::config::LinksToSkip;
    /// use ripple_check::url::LinkMatcher;
    ///
    /// let matcher = LinkMatcher::new(&LinksToSkip::Patterns(vec![
    ///     "^https://twitter\\.com".to_string(),
    /// ]))
    /// .unwrap();
    ///
    /// assert!(matcher.is_skipped("https://twitter.com/someone"));
    /// assert!(!matcher.is_skipped("https://example.com/"));
    /// ```
    pub fn is_skipped(&self, url: &str) -> bool {
        match self {
            Self::Patterns(patterns) => patterns.iter().any(|re| re.is_match(url)),
            Self::Predicate(predicate) => predicate(url),
        }
    }
}

impl std::fmt::Debug for LinkMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Patterns(patterns) => f.debug_tuple("Patterns").field(patterns).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}
