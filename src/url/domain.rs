use url::Url;

/// Extracts the host used as the rate-limit key for a URL
///
/// This function retrieves the host portion of a URL, converts it to
/// lowercase and appends the effective port, so a default port and an
/// explicit one share a key while other services on the same machine do
/// not. Returns None for URLs without a host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ripple_check::url::extract_host;
///
/// let url = Url::parse("https://example.com/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com:443".to_string()));
///
/// let url = Url::parse("https://EXAMPLE.COM:8443/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com:8443".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();

    Some(match url.port_or_known_default() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}
