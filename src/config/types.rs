use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Predicate deciding whether a link should be skipped
pub type SkipPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Run-wide options for a check
///
/// Options are immutable for the duration of a run. Every field has a default
/// so a TOML file only needs to name what it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckOptions {
    /// Maximum number of requests in flight at once
    #[serde(rename = "concurrency")]
    pub concurrency: usize,

    /// Starting locations: http(s) URLs, or local files and directories
    #[serde(rename = "path", deserialize_with = "one_or_many")]
    pub paths: Vec<String>,

    /// Follow same-origin links found on crawled pages
    #[serde(rename = "recurse")]
    pub recurse: bool,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "timeout")]
    pub timeout: Option<u64>,

    /// Links matching any of these are reported as skipped without a request
    #[serde(rename = "skip")]
    pub links_to_skip: LinksToSkip,

    /// Honour HTTP 429 responses carrying a retry-after header
    #[serde(rename = "retry")]
    pub retry: bool,

    /// Back off and retry on 5xx responses and network errors
    #[serde(rename = "retry-errors")]
    pub retry_errors: bool,

    /// Maximum number of error retries per URL
    #[serde(rename = "retry-errors-count")]
    pub retry_errors_count: u32,

    /// Random jitter added to each error backoff (milliseconds)
    #[serde(rename = "retry-errors-jitter")]
    pub retry_errors_jitter: u64,

    /// How redirects are treated
    #[serde(rename = "redirects")]
    pub redirects: RedirectMode,

    /// How plain http:// links are treated
    #[serde(rename = "require-https")]
    pub require_https: HttpsMode,

    /// Status code (e.g. "404") or class (e.g. "4xx") -> action
    #[serde(rename = "status-codes")]
    pub status_codes: BTreeMap<String, StatusAction>,

    /// Verify that `#fragment` targets exist on HTML pages
    #[serde(rename = "check-fragments")]
    pub check_fragments: bool,

    /// Ordered rewrites applied to every URL before it is fetched
    #[serde(rename = "url-rewrite")]
    pub url_rewrite_expressions: Vec<UrlRewrite>,

    /// Extra headers sent with every request
    #[serde(rename = "headers")]
    pub extra_headers: BTreeMap<String, String>,

    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: Option<String>,

    /// Skip TLS certificate validation
    #[serde(rename = "allow-insecure-certs")]
    pub allow_insecure_certs: bool,

    /// Directory served by the local server (local paths only)
    #[serde(rename = "server-root")]
    pub server_root: Option<PathBuf>,

    /// Render markdown files to HTML when serving local paths
    #[serde(rename = "markdown")]
    pub markdown: bool,

    /// Serve generated listings for directories without an index.html
    #[serde(rename = "directory-listing")]
    pub directory_listing: bool,

    /// Port for the local server (0 or unset picks a free port)
    #[serde(rename = "port")]
    pub port: Option<u16>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            concurrency: 100,
            paths: Vec::new(),
            recurse: false,
            timeout: None,
            links_to_skip: LinksToSkip::default(),
            retry: false,
            retry_errors: false,
            retry_errors_count: 5,
            retry_errors_jitter: 3000,
            redirects: RedirectMode::default(),
            require_https: HttpsMode::default(),
            status_codes: BTreeMap::new(),
            check_fragments: false,
            url_rewrite_expressions: Vec::new(),
            extra_headers: BTreeMap::new(),
            user_agent: None,
            allow_insecure_certs: false,
            server_root: None,
            markdown: false,
            directory_listing: false,
            port: None,
        }
    }
}

impl CheckOptions {
    /// Creates options for the given paths with every other field defaulted
    pub fn with_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Accepts either `path = "x"` or `path = ["x", "y"]`
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(path) => vec![path],
        OneOrMany::Many(paths) => paths,
    })
}

/// Links to skip: regex patterns from configuration, or a caller predicate
#[derive(Clone, Deserialize)]
#[serde(from = "Vec<String>")]
pub enum LinksToSkip {
    /// Regular expressions tested against each URL
    Patterns(Vec<String>),

    /// Caller-supplied predicate; true means skip
    Predicate(SkipPredicate),
}

impl Default for LinksToSkip {
    fn default() -> Self {
        Self::Patterns(Vec::new())
    }
}

impl From<Vec<String>> for LinksToSkip {
    fn from(patterns: Vec<String>) -> Self {
        Self::Patterns(patterns)
    }
}

impl fmt::Debug for LinksToSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Patterns(patterns) => f.debug_tuple("Patterns").field(patterns).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Redirect handling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectMode {
    /// Follow redirects silently
    #[default]
    Allow,
    /// Follow redirects but report each one
    Warn,
    /// Do not follow; a redirect marks the link broken
    Error,
}

impl FromStr for RedirectMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(Self::Allow),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "invalid redirects mode '{}' (expected allow, warn or error)",
                other
            )),
        }
    }
}

/// HTTPS requirement mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpsMode {
    /// http:// links are fine
    #[default]
    Off,
    /// http:// links are reported but not failed
    Warn,
    /// http:// links are broken
    Error,
}

impl FromStr for HttpsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(Self::Off),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "invalid require-https mode '{}' (expected off, warn or error)",
                other
            )),
        }
    }
}

/// Action a status-code rule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusAction {
    /// Treat as OK
    Ok,
    /// Treat as OK and emit a warning
    Warn,
    /// Treat as skipped
    Skip,
    /// Treat as broken
    Error,
}

impl FromStr for StatusAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(Self::Ok),
            "warn" => Ok(Self::Warn),
            "skip" => Ok(Self::Skip),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "invalid status action '{}' (expected ok, warn, skip or error)",
                other
            )),
        }
    }
}

/// One search/replace rule applied to URLs before fetching
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UrlRewrite {
    /// Regular expression to search for
    #[serde(rename = "pattern")]
    pub pattern: String,

    /// Replacement text (supports `$1`-style capture references)
    #[serde(rename = "replacement")]
    pub replacement: String,
}

impl UrlRewrite {
    /// Builds a rewrite from the paired search/replace command-line flags
    ///
    /// Returns `Ok(None)` when neither flag is set; one without the other is
    /// a configuration error.
    pub fn from_flags(search: Option<String>, replace: Option<String>) -> ConfigResult<Option<Self>> {
        match (search, replace) {
            (None, None) => Ok(None),
            (Some(pattern), Some(replacement)) => Ok(Some(Self {
                pattern,
                replacement,
            })),
            (Some(_), None) => Err(ConfigError::Validation(
                "url-rewrite-search was provided without url-rewrite-replace".to_string(),
            )),
            (None, Some(_)) => Err(ConfigError::Validation(
                "url-rewrite-replace was provided without url-rewrite-search".to_string(),
            )),
        }
    }
}
