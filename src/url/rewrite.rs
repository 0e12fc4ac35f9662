use crate::config::UrlRewrite;
use crate::ConfigError;
use regex::Regex;

/// Ordered URL rewrite rules compiled for one run
#[derive(Debug, Clone, Default)]
pub struct UrlRewriter {
    rules: Vec<(Regex, String)>,
}

impl UrlRewriter {
    /// Compiles the configured rewrite rules
    pub fn new(rewrites: &[UrlRewrite]) -> Result<Self, ConfigError> {
        let rules = rewrites
            .iter()
            .map(|r| Ok((crate::config::compile_pattern(&r.pattern)?, r.replacement.clone())))
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { rules })
    }

    /// Applies every rule in order
    ///
    /// Each rule sees the output of the previous one, so a later rule may
    /// re-match text an earlier rule produced.
    ///
    /// # Examples
    ///
    /// ```
    /// use ripple_check::config::UrlRewrite;
    /// use ripple_check::url::UrlRewriter;
    ///
    /// let rewriter = UrlRewriter::new(&[UrlRewrite {
    ///     pattern: "^https://old\\.example\\.com".to_string(),
    ///     replacement: "https://example.com".to_string(),
    /// }])
    /// .unwrap();
    ///
    /// assert_eq!(
    ///     rewriter.apply("https://old.example.com/page"),
    ///     "https://example.com/page"
    /// );
    /// ```
    pub fn apply(&self, url: &str) -> String {
        self.rules
            .iter()
            .fold(url.to_string(), |current, (pattern, replacement)| {
                pattern.replace_all(&current, replacement.as_str()).into_owned()
            })
    }

    /// Returns true when no rules are configured
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
