use crate::config::types::{CheckOptions, LinksToSkip, UrlRewrite};
use crate::url::is_http_url;
use crate::ConfigError;
use regex::Regex;
use reqwest::header::{HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::path::Path;

/// Validates the run options before any crawling starts
///
/// Every error returned here is fatal to the whole run.
pub fn validate(options: &CheckOptions) -> Result<(), ConfigError> {
    validate_paths(&options.paths)?;
    validate_concurrency(options.concurrency)?;
    validate_skip_list(&options.links_to_skip)?;
    validate_rewrites(&options.url_rewrite_expressions)?;
    validate_status_codes(&options.status_codes)?;
    validate_headers(&options.extra_headers)?;

    if let Some(root) = &options.server_root {
        if !root.is_dir() {
            return Err(ConfigError::Validation(format!(
                "server-root '{}' is not a directory",
                root.display()
            )));
        }
    }

    Ok(())
}

/// Validates the starting paths
///
/// Paths must be all remote or all local; local paths must exist.
fn validate_paths(paths: &[String]) -> Result<(), ConfigError> {
    if paths.is_empty() {
        return Err(ConfigError::Validation(
            "At least one path must be provided".to_string(),
        ));
    }

    let remote = paths.iter().filter(|p| is_http_url(p)).count();
    if remote != 0 && remote != paths.len() {
        return Err(ConfigError::Validation(
            "Paths cannot be a mix of local files and remote URLs".to_string(),
        ));
    }

    if remote == 0 {
        for path in paths {
            if !Path::new(path).exists() {
                return Err(ConfigError::Validation(format!(
                    "Cannot find local path '{}'",
                    path
                )));
            }
        }
    } else {
        for path in paths {
            ::url::Url::parse(path)
                .map_err(|e| ConfigError::InvalidUrl(format!("Invalid path '{}': {}", path, e)))?;
        }
    }

    Ok(())
}

fn validate_concurrency(concurrency: usize) -> Result<(), ConfigError> {
    if concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be >= 1, got {}",
            concurrency
        )));
    }
    Ok(())
}

fn validate_skip_list(skip: &LinksToSkip) -> Result<(), ConfigError> {
    if let LinksToSkip::Patterns(patterns) = skip {
        for pattern in patterns {
            compile_pattern(pattern)?;
        }
    }
    Ok(())
}

fn validate_rewrites(rewrites: &[UrlRewrite]) -> Result<(), ConfigError> {
    for rewrite in rewrites {
        compile_pattern(&rewrite.pattern)?;
    }
    Ok(())
}

/// Validates status-code rule keys: an exact code ("404") or a class ("4xx")
fn validate_status_codes<V>(rules: &BTreeMap<String, V>) -> Result<(), ConfigError> {
    for key in rules.keys() {
        if !is_valid_status_key(key) {
            return Err(ConfigError::InvalidPattern(format!(
                "Invalid status code rule '{}' (expected e.g. '404' or '4xx')",
                key
            )));
        }
    }
    Ok(())
}

pub(crate) fn is_valid_status_key(key: &str) -> bool {
    let bytes = key.as_bytes();
    if bytes.len() != 3 || !(b'1'..=b'5').contains(&bytes[0]) {
        return false;
    }

    let rest = &key[1..];
    rest == "xx" || rest.bytes().all(|b| b.is_ascii_digit())
}

fn validate_headers(headers: &BTreeMap<String, String>) -> Result<(), ConfigError> {
    for (name, value) in headers {
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            ConfigError::Validation(format!("Invalid header name '{}'", name))
        })?;
        HeaderValue::from_str(value).map_err(|_| {
            ConfigError::Validation(format!("Invalid value for header '{}'", name))
        })?;
    }
    Ok(())
}

/// Compiles a user-supplied regular expression
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern)
        .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))
}
