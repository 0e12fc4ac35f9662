//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the checker, including:
//! - Building HTTP clients from the run options
//! - HEAD and GET requests, with or without reading the body
//! - Manual redirect handling so redirects can be observed or refused
//! - Error classification for transport failures

use crate::config::CheckOptions;
use crate::policy::RedirectInfo;
use crate::UrlError;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, LOCATION, RETRY_AFTER,
};
use reqwest::{redirect::Policy, Client, Method, Response};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default user agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("ripple-check/", env!("CARGO_PKG_VERSION"));

/// Maximum redirect hops followed for one request
pub const MAX_REDIRECTS: usize = 10;

/// HTTP method used for a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMethod {
    Head,
    Get,
}

impl FetchMethod {
    fn as_method(self) -> Method {
        match self {
            Self::Head => Method::HEAD,
            Self::Get => Method::GET,
        }
    }
}

/// A response obtained for a link
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Final HTTP status code
    pub status: u16,

    /// URL the final response came from
    pub final_url: Url,

    /// Content-Type header value
    pub content_type: Option<String>,

    /// Raw `retry-after` header value
    pub retry_after: Option<String>,

    /// Page body, read only when requested on a GET
    pub body: Option<String>,

    /// First redirect seen, or the refused redirect in error mode
    pub redirect: Option<RedirectInfo>,

    /// Method of the request that produced this response
    pub method: FetchMethod,
}

impl FetchResponse {
    /// Returns whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns whether the response declares an HTML body
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map_or(false, |ct| ct.to_ascii_lowercase().starts_with("text/html"))
    }
}

/// A request that produced no usable response
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{}", describe_error(.0))]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Redirect(#[from] UrlError),
}

/// Builds an HTTP client from the run options
///
/// Redirects are never followed by the client itself; [`fetch`] walks them
/// so each hop can be inspected.
///
/// # Arguments
///
/// * `options` - The run options
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use ripple_check::crawler::build_http_client;
/// use ripple_check::CheckOptions;
///
/// let options = CheckOptions::with_paths(["https://example.com/"]);
/// let client = build_http_client(&options).unwrap();
/// ```
pub fn build_http_client(options: &CheckOptions) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    for (name, value) in &options.extra_headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!("Ignoring invalid header '{}'", name),
        }
    }

    let user_agent = options
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

    let mut builder = Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .redirect(Policy::none()) // Handle redirects manually
        .danger_accept_invalid_certs(options.allow_insecure_certs)
        .gzip(true)
        .brotli(true);

    if let Some(timeout) = options.timeout.filter(|ms| *ms > 0) {
        builder = builder.timeout(Duration::from_millis(timeout));
    }

    builder.build()
}

/// Fetches a URL, walking redirects by hand
///
/// # Request Flow
///
/// 1. Send the request without the URL fragment
/// 2. On a 3xx with a `Location`, record the hop and either follow it or,
///    when `follow_redirects` is false, return the 3xx as final
/// 3. Stop after [`MAX_REDIRECTS`] hops or when a URL repeats
/// 4. Read the body only for a GET with `read_body` set
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `method` - HEAD or GET
/// * `follow_redirects` - Whether 3xx responses are followed
/// * `read_body` - Whether to read the final body (GET only)
pub async fn fetch(
    client: &Client,
    url: &Url,
    method: FetchMethod,
    follow_redirects: bool,
    read_body: bool,
) -> Result<FetchResponse, FetchError> {
    let mut current = url.clone();
    current.set_fragment(None);

    let mut visited = HashSet::new();
    visited.insert(current.to_string());

    // (status, non-standard) of the first hop
    let mut first_hop: Option<(u16, bool)> = None;

    for _ in 0..=MAX_REDIRECTS {
        tracing::trace!("{:?} {}", method, current);
        let response = client
            .request(method.as_method(), current.clone())
            .send()
            .await?;

        let status = response.status();
        let target = if status.is_redirection() {
            location(&response).and_then(|loc| current.join(&loc).ok())
        } else {
            None
        };

        let Some(target) = target else {
            let redirect = first_hop.map(|(status, non_standard)| RedirectInfo {
                status,
                target: current.to_string(),
                non_standard,
            });
            return finish(response, current, method, read_body, redirect).await;
        };

        let hop_status = status.as_u16();
        let non_standard = has_body(response, method).await;
        tracing::debug!("Redirect {} {} -> {}", hop_status, current, target);

        if !follow_redirects {
            return Ok(FetchResponse {
                status: hop_status,
                final_url: current,
                content_type: None,
                retry_after: None,
                body: None,
                redirect: Some(RedirectInfo {
                    status: hop_status,
                    target: target.to_string(),
                    non_standard,
                }),
                method,
            });
        }

        let first = first_hop.get_or_insert((hop_status, false));
        first.1 |= non_standard;

        if !visited.insert(target.to_string()) {
            return Err(UrlError::RedirectLoop {
                url: target.to_string(),
            }
            .into());
        }
        current = target;
    }

    Err(UrlError::RedirectLimit {
        url: url.to_string(),
    }
    .into())
}

async fn finish(
    response: Response,
    final_url: Url,
    method: FetchMethod,
    read_body: bool,
    redirect: Option<RedirectInfo>,
) -> Result<FetchResponse, FetchError> {
    let status = response.status().as_u16();
    let content_type = header_string(&response, CONTENT_TYPE);
    let retry_after = header_string(&response, RETRY_AFTER);

    let body = if read_body && method == FetchMethod::Get {
        Some(response.text().await?)
    } else {
        None
    };

    Ok(FetchResponse {
        status,
        final_url,
        content_type,
        retry_after,
        body,
        redirect,
        method,
    })
}

fn location(response: &Response) -> Option<String> {
    header_string(response, LOCATION)
}

fn header_string(response: &Response, name: HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Whether a 3xx carried a body, which marks the redirect non-standard
async fn has_body(response: Response, method: FetchMethod) -> bool {
    match method {
        FetchMethod::Head => header_string(&response, CONTENT_LENGTH)
            .and_then(|len| len.trim().parse::<u64>().ok())
            .map_or(false, |len| len > 0),
        FetchMethod::Get => response
            .bytes()
            .await
            .map(|bytes| !bytes.is_empty())
            .unwrap_or(false),
    }
}

/// Produces a short description of a transport error
pub fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else if error.is_body() || error.is_decode() {
        format!("Failed to read response body: {}", error)
    } else {
        error.to_string()
    }
}
