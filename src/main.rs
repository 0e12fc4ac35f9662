//! Ripple-Check main entry point
//!
//! This is the command-line interface for the Ripple-Check link checker.

use anyhow::{anyhow, Context};
use clap::Parser;
use ripple_check::config::{load_config, HttpsMode, LinksToSkip, RedirectMode, StatusAction, UrlRewrite};
use ripple_check::output::{render_report, OutputFormat};
use ripple_check::{CheckOptions, CrawlEvent, LinkChecker, LinkState};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Ripple-Check: find broken links in websites and local docs
///
/// Ripple-Check requests every link on the given pages, optionally recursing
/// through same-origin pages, and reports which ones are broken. Local files
/// and directories are served over a temporary local HTTP server.
#[derive(Parser, Debug)]
#[command(name = "ripple-check")]
#[command(version)]
#[command(about = "A concurrent broken-link checker", long_about = None)]
struct Cli {
    /// URLs, or local files and directories, to check
    #[arg(value_name = "PATHS")]
    paths: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Recursively follow links on the same root domain
    #[arg(short, long)]
    recurse: bool,

    /// Maximum number of requests in flight
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Regular expression of links to skip (repeatable)
    #[arg(short, long, value_name = "REGEX")]
    skip: Vec<String>,

    /// Request timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,

    /// Honour retry-after on HTTP 429 responses
    #[arg(long)]
    retry: bool,

    /// Retry 5xx responses and network errors with back-off
    #[arg(long)]
    retry_errors: bool,

    /// Maximum retries per link for --retry-errors
    #[arg(long, value_name = "N")]
    retry_errors_count: Option<u32>,

    /// Random jitter added to each error back-off, in milliseconds
    #[arg(long, value_name = "MS")]
    retry_errors_jitter: Option<u64>,

    /// How to treat redirects: allow, warn or error
    #[arg(long, value_name = "MODE")]
    redirects: Option<RedirectMode>,

    /// How to treat http:// links: off, warn or error
    #[arg(long, value_name = "MODE")]
    require_https: Option<HttpsMode>,

    /// Status code rule such as 404:skip or 4xx:warn (repeatable)
    #[arg(long = "status-code", value_name = "CODE:ACTION", value_parser = parse_status_rule)]
    status_codes: Vec<(String, StatusAction)>,

    /// Verify that #fragment targets exist on HTML pages
    #[arg(long)]
    check_fragments: bool,

    /// Regular expression to search for in each URL
    #[arg(long, value_name = "REGEX")]
    url_rewrite_search: Option<String>,

    /// Replacement for --url-rewrite-search
    #[arg(long, value_name = "TEXT")]
    url_rewrite_replace: Option<String>,

    /// User agent sent with every request
    #[arg(long, value_name = "AGENT")]
    user_agent: Option<String>,

    /// Extra request header such as "Authorization: Bearer x" (repeatable)
    #[arg(long = "header", value_name = "NAME:VALUE", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Do not validate TLS certificates
    #[arg(long)]
    allow_insecure_certs: bool,

    /// Directory the local server serves
    #[arg(long, value_name = "DIR")]
    server_root: Option<PathBuf>,

    /// Render markdown files to HTML when serving local paths
    #[arg(long)]
    markdown: bool,

    /// Serve listings for directories without an index.html
    #[arg(long)]
    directory_listing: bool,

    /// Port for the local server
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,

    /// Report format: text, json or csv
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    format: OutputFormat,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_check=info,warn"),
            1 => EnvFilter::new("ripple_check=debug,info"),
            2 => EnvFilter::new("ripple_check=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Runs a check and prints the report, returning whether it passed
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let format = cli.format;
    let options = build_options(cli)?;

    let mut checker = LinkChecker::new(options);
    let mut events = checker.subscribe();
    let logger = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    let report = checker.check().await.context("check failed")?;
    // The sender is dropped with the checker, so the logger drains and exits
    let _ = logger.await;

    let rendered = render_report(&report, format).context("failed to render report")?;
    print!("{}", rendered);

    Ok(report.passed)
}

/// Merges the configuration file (if any) with command-line flags
///
/// Flags win over file values; repeatable flags are appended.
fn build_options(cli: Cli) -> anyhow::Result<CheckOptions> {
    let mut options = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => CheckOptions::default(),
    };

    if !cli.paths.is_empty() {
        options.paths = cli.paths;
    }
    if options.paths.is_empty() {
        return Err(anyhow!("at least one path must be provided"));
    }

    options.recurse |= cli.recurse;
    options.retry |= cli.retry;
    options.retry_errors |= cli.retry_errors;
    options.check_fragments |= cli.check_fragments;
    options.allow_insecure_certs |= cli.allow_insecure_certs;
    options.markdown |= cli.markdown;
    options.directory_listing |= cli.directory_listing;

    if let Some(concurrency) = cli.concurrency {
        options.concurrency = concurrency;
    }
    if let Some(timeout) = cli.timeout {
        options.timeout = Some(timeout);
    }
    if let Some(count) = cli.retry_errors_count {
        options.retry_errors_count = count;
    }
    if let Some(jitter) = cli.retry_errors_jitter {
        options.retry_errors_jitter = jitter;
    }
    if let Some(redirects) = cli.redirects {
        options.redirects = redirects;
    }
    if let Some(require_https) = cli.require_https {
        options.require_https = require_https;
    }
    if cli.user_agent.is_some() {
        options.user_agent = cli.user_agent;
    }
    if cli.server_root.is_some() {
        options.server_root = cli.server_root;
    }
    if cli.port.is_some() {
        options.port = cli.port;
    }

    if !cli.skip.is_empty() {
        match &mut options.links_to_skip {
            LinksToSkip::Patterns(patterns) => patterns.extend(cli.skip),
            LinksToSkip::Predicate(_) => options.links_to_skip = LinksToSkip::Patterns(cli.skip),
        }
    }

    options.status_codes.extend(cli.status_codes);
    options.extra_headers.extend(cli.headers);

    if let Some(rewrite) = UrlRewrite::from_flags(cli.url_rewrite_search, cli.url_rewrite_replace)? {
        options.url_rewrite_expressions.push(rewrite);
    }

    Ok(options)
}

fn log_event(event: &CrawlEvent) {
    match event {
        CrawlEvent::Link(link) => match link.state {
            LinkState::Broken => tracing::warn!("[{}] {}", link.status, link.url),
            LinkState::Skipped => tracing::debug!("[SKIP] {}", link.url),
            LinkState::Ok => tracing::debug!("[{}] {}", link.status, link.url),
        },
        CrawlEvent::PageStart { url } => tracing::info!("Scanning {}", url),
        CrawlEvent::Retry {
            url,
            status,
            seconds_until_retry,
        } => tracing::warn!(
            "Retrying {} (status {}) in {}s",
            url,
            status,
            seconds_until_retry
        ),
        CrawlEvent::Redirect {
            url,
            status,
            target_url,
            non_standard,
        } => tracing::warn!(
            "Redirect {} -> {} (status {}{})",
            url,
            target_url,
            status,
            if *non_standard { ", non-standard" } else { "" }
        ),
        CrawlEvent::HttpInsecure { url } => tracing::warn!("Insecure link {}", url),
        CrawlEvent::StatusCodeWarning { url, status } => {
            tracing::warn!("Status {} for {}", status, url)
        }
    }
}

/// Parses `CODE:ACTION`, e.g. `404:skip`
fn parse_status_rule(value: &str) -> Result<(String, StatusAction), String> {
    let (code, action) = value
        .split_once(':')
        .ok_or_else(|| format!("expected CODE:ACTION, got '{}'", value))?;
    Ok((code.trim().to_string(), action.trim().parse()?))
}

/// Parses `NAME:VALUE`, e.g. `Authorization: Bearer x`
fn parse_header(value: &str) -> Result<(String, String), String> {
    let (name, header_value) = value
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got '{}'", value))?;
    Ok((name.trim().to_string(), header_value.trim().to_string()))
}
