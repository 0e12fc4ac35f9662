//! Configuration module for Ripple-Check
//!
//! This module handles the run-wide [`CheckOptions`], loading them from a TOML
//! file, and validating them before any crawling starts.
//!
//! # Example
//!
//! ```no_run
//! use ripple_check::config::load_config;
//! use std::path::Path;
//!
//! let options = load_config(Path::new("ripple-check.toml")).unwrap();
//! println!("Checking with concurrency {}", options.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CheckOptions, HttpsMode, LinksToSkip, RedirectMode, SkipPredicate, StatusAction, UrlRewrite,
};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
pub(crate) use validation::compile_pattern;
