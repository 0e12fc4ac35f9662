//! Ripple-Check: a concurrent broken-link checker
//!
//! This crate crawls a set of starting locations (remote URLs, or local files
//! served over a throwaway HTTP server) and reports which links resolve and
//! which are broken, optionally recursing across same-origin pages.

pub mod config;
pub mod crawler;
pub mod output;
pub mod policy;
pub mod server;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for run-level failures
///
/// Individual broken links never surface here; they are recorded as
/// [`output::LinkResult`]s. Only conditions that prevent a run from starting
/// (or the local server from serving) are reported as errors.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Local server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Too many redirects from {url}")]
    RedirectLimit { url: String },

    #[error("Redirect loop detected at {url}")]
    RedirectLoop { url: String },
}

/// Result type alias for Ripple-Check operations
pub type Result<T> = std::result::Result<T, CheckError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::CheckOptions;
pub use crawler::{check, CrawlEvent, LinkChecker};
pub use output::{CheckReport, FailureDetail, LinkResult};
pub use state::LinkState;
