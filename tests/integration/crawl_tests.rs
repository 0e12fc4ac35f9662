//! Integration tests for the link checker
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full check cycle end-to-end.

use ripple_check::config::{HttpsMode, LinksToSkip, RedirectMode, StatusAction, UrlRewrite};
use ripple_check::{CheckError, CheckOptions, CheckReport, CrawlEvent, LinkChecker, LinkResult, LinkState};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Creates options for a single root with a small concurrency
fn create_test_options(root: &str) -> CheckOptions {
    let mut options = CheckOptions::with_paths([root]);
    options.concurrency = 5;
    options.timeout = Some(5000);
    options
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<!DOCTYPE html><html><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_ok(server: &MockServer, route: &str) {
    Mock::given(path(route))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

/// Runs a check and collects every event it published
async fn check_with_events(options: CheckOptions) -> (CheckReport, Vec<CrawlEvent>) {
    let mut checker = LinkChecker::new(options);
    let mut receiver = checker.subscribe();
    let report = checker.check().await.expect("check failed to start");

    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    (report, events)
}

/// Answers the first request with `first` and later ones with `rest`,
/// remembering when each request arrived
#[derive(Clone)]
struct TimedResponder {
    hits: Arc<Mutex<Vec<Instant>>>,
    first: ResponseTemplate,
    rest: ResponseTemplate,
}

impl TimedResponder {
    fn new(first: ResponseTemplate, rest: ResponseTemplate) -> Self {
        Self {
            hits: Arc::new(Mutex::new(Vec::new())),
            first,
            rest,
        }
    }

    fn hits(&self) -> Vec<Instant> {
        self.hits.lock().unwrap().clone()
    }
}

impl Respond for TimedResponder {
    fn respond(&self, _: &Request) -> ResponseTemplate {
        let mut hits = self.hits.lock().unwrap();
        hits.push(Instant::now());
        if hits.len() == 1 {
            self.first.clone()
        } else {
            self.rest.clone()
        }
    }
}

fn count_results(report: &CheckReport, suffix: &str) -> usize {
    report
        .links
        .iter()
        .filter(|link| link.url.ends_with(suffix))
        .count()
}

fn find<'a>(report: &'a CheckReport, url: &str) -> &'a LinkResult {
    report
        .links
        .iter()
        .find(|link| link.url == url)
        .unwrap_or_else(|| panic!("no result for {} in {:#?}", url, report.links))
}

#[tokio::test]
async fn test_single_page_all_links_ok() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/one">1</a><img src="/logo.png">"#).await;
    mount_ok(&server, "/one").await;
    mount_ok(&server, "/logo.png").await;

    let report = ripple_check::check(create_test_options(&format!("{}/", base)))
        .await
        .unwrap();

    assert!(report.passed);
    assert_eq!(report.links.len(), 3);
    assert_eq!(find(&report, &format!("{}/", base)).parent, None);

    let one = find(&report, &format!("{}/one", base));
    assert_eq!(one.state, LinkState::Ok);
    assert_eq!(one.status, 200);
    assert_eq!(one.parent.as_deref(), Some(format!("{}/", base).as_str()));
}

#[tokio::test]
async fn test_broken_link_fails_run() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/missing">gone</a>"#).await;

    let report = ripple_check::check(create_test_options(&format!("{}/", base)))
        .await
        .unwrap();

    assert!(!report.passed);
    let missing = find(&report, &format!("{}/missing", base));
    assert_eq!(missing.state, LinkState::Broken);
    assert_eq!(missing.status, 404);
    assert!(missing
        .failure_details
        .iter()
        .any(|d| d.to_string().starts_with("HTTP 404")));
}

#[tokio::test]
async fn test_skipped_links() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"
        <a href="mailto:someone@example.com">mail</a>
        <a href="https://twitter.com/someone">tweet</a>
        <a href="/ok">ok</a>
        "#,
    )
    .await;
    mount_ok(&server, "/ok").await;

    let mut options = create_test_options(&format!("{}/", base));
    options.links_to_skip = LinksToSkip::Patterns(vec!["twitter\\.com".to_string()]);

    let report = ripple_check::check(options).await.unwrap();

    assert!(report.passed);
    assert_eq!(find(&report, "mailto:someone@example.com").state, LinkState::Skipped);
    let tweet = find(&report, "https://twitter.com/someone");
    assert_eq!(tweet.state, LinkState::Skipped);
    assert_eq!(tweet.status, 0);
}

#[tokio::test]
async fn test_skip_predicate() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/private/a">a</a>"#).await;
    Mock::given(path("/private/a"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let mut options = create_test_options(&format!("{}/", base));
    options.links_to_skip = LinksToSkip::Predicate(Arc::new(|url: &str| url.contains("/private/")));

    let report = ripple_check::check(options).await.unwrap();
    assert!(report.passed);
    assert_eq!(
        find(&report, &format!("{}/private/a", base)).state,
        LinkState::Skipped
    );
}

#[tokio::test]
async fn test_each_url_checked_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/a">a</a><a href="/b">b</a><a href="/shared">s</a><a href="/shared">again</a>"#,
    )
    .await;
    mount_page(&server, "/a", r#"<a href="/shared">s</a><a href="/b">b</a>"#).await;
    mount_page(&server, "/b", r#"<a href="/shared">s</a><a href="/">home</a>"#).await;
    Mock::given(path("/shared"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut options = create_test_options(&format!("{}/", base));
    options.recurse = true;

    let report = ripple_check::check(options).await.unwrap();

    assert!(report.passed);
    assert_eq!(report.links.len(), 4);
    let shared: Vec<_> = report
        .links
        .iter()
        .filter(|link| link.url.ends_with("/shared"))
        .collect();
    assert_eq!(shared.len(), 1);
}

#[tokio::test]
async fn test_recursion_stays_on_root() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/docs/",
        &format!(
            r#"<a href="/docs/guide">guide</a><a href="/blog">blog</a><a href="{}/external">ext</a>"#,
            other.uri()
        ),
    )
    .await;
    mount_page(&server, "/docs/guide", r#"<a href="/docs/deep">deep</a>"#).await;
    mount_ok(&server, "/docs/deep").await;
    Mock::given(path("/blog"))
        .respond_with(html(r#"<a href="/blog/never">never</a>"#))
        .mount(&server)
        .await;
    Mock::given(path("/blog/never"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(path("/external"))
        .respond_with(html(r#"<a href="/never">never</a>"#))
        .mount(&other)
        .await;
    Mock::given(path("/never"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&other)
        .await;

    let mut options = create_test_options(&format!("{}/docs/", base));
    options.recurse = true;

    let report = ripple_check::check(options).await.unwrap();

    assert!(report.passed);
    assert_eq!(report.links.len(), 5);
    assert_eq!(
        find(&report, &format!("{}/docs/deep", base)).parent.as_deref(),
        Some(format!("{}/docs/guide", base).as_str())
    );
}

#[tokio::test]
async fn test_without_recurse_children_are_not_scanned() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/child">child</a>"#).await;
    Mock::given(path("/child"))
        .respond_with(html(r#"<a href="/grandchild">grandchild</a>"#))
        .mount(&server)
        .await;
    Mock::given(path("/grandchild"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = ripple_check::check(create_test_options(&format!("{}/", base)))
        .await
        .unwrap();
    assert_eq!(report.links.len(), 2);
}

#[tokio::test]
async fn test_status_code_rules() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/missing">m</a><a href="/forbidden">f</a>"#).await;
    Mock::given(path("/forbidden"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let mut options = create_test_options(&format!("{}/", base));
    options.status_codes.insert("4xx".to_string(), StatusAction::Warn);
    options.status_codes.insert("404".to_string(), StatusAction::Skip);

    let (report, events) = check_with_events(options).await;

    assert!(report.passed);
    let missing = find(&report, &format!("{}/missing", base));
    assert_eq!(missing.state, LinkState::Skipped);
    assert_eq!(missing.status, 404);

    let forbidden = find(&report, &format!("{}/forbidden", base));
    assert_eq!(forbidden.state, LinkState::Ok);
    assert_eq!(forbidden.status, 403);

    let warnings: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, CrawlEvent::StatusCodeWarning { status: 403, .. }))
        .collect();
    assert_eq!(warnings.len(), 1);
}

#[tokio::test]
async fn test_head_not_allowed_falls_back_to_get() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/no-head">x</a>"#).await;
    Mock::given(method("HEAD"))
        .and(path("/no-head"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/no-head"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let report = ripple_check::check(create_test_options(&format!("{}/", base)))
        .await
        .unwrap();

    assert!(report.passed);
    assert_eq!(find(&report, &format!("{}/no-head", base)).status, 200);
}

#[tokio::test]
async fn test_retry_after_is_honoured() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/limited">l</a>"#).await;
    Mock::given(path("/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_ok(&server, "/limited").await;

    let mut options = create_test_options(&format!("{}/", base));
    options.retry = true;

    let started = Instant::now();
    let (report, events) = check_with_events(options).await;

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(report.passed);

    let limited: Vec<_> = report
        .links
        .iter()
        .filter(|link| link.url.ends_with("/limited"))
        .collect();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].status, 200);

    assert!(events.iter().any(|e| matches!(
        e,
        CrawlEvent::Retry {
            status: 429,
            seconds_until_retry: 1,
            ..
        }
    )));
}

#[tokio::test]
async fn test_429_without_retry_is_broken() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/limited">l</a>"#).await;
    Mock::given(path("/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .mount(&server)
        .await;

    let report = ripple_check::check(create_test_options(&format!("{}/", base)))
        .await
        .unwrap();

    assert!(!report.passed);
    assert_eq!(find(&report, &format!("{}/limited", base)).status, 429);
}

#[tokio::test]
async fn test_unrepresentable_retry_after_is_final() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/limited">l</a>"#).await;
    Mock::given(path("/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "99999999999999"))
        .mount(&server)
        .await;

    let mut options = create_test_options(&format!("{}/", base));
    options.retry = true;

    let report = ripple_check::check(options).await.unwrap();

    assert!(!report.passed);
    assert_eq!(count_results(&report, "/limited"), 1);
    let limited = find(&report, &format!("{}/limited", base));
    assert_eq!(limited.state, LinkState::Broken);
    assert_eq!(limited.status, 429);
}

#[tokio::test]
async fn test_host_delay_holds_back_other_links() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/limited">l</a><a href="/slow">s</a>"#).await;

    let limited = TimedResponder::new(
        ResponseTemplate::new(429).insert_header("retry-after", "2"),
        ResponseTemplate::new(200),
    );
    Mock::given(path("/limited"))
        .respond_with(limited.clone())
        .mount(&server)
        .await;

    // Discovered only after the 429 has set the host deadline
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html(r#"<a href="/other">o</a>"#).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let other = TimedResponder::new(ResponseTemplate::new(200), ResponseTemplate::new(200));
    Mock::given(path("/other"))
        .respond_with(other.clone())
        .mount(&server)
        .await;

    let mut options = create_test_options(&format!("{}/", base));
    options.retry = true;
    options.recurse = true;

    let report = ripple_check::check(options).await.unwrap();

    assert!(report.passed);
    assert_eq!(report.links.len(), 4);
    for suffix in ["/limited", "/slow", "/other"] {
        assert_eq!(count_results(&report, suffix), 1, "results for {}", suffix);
    }

    let limited_hits = limited.hits();
    let other_hits = other.hits();
    assert_eq!(limited_hits.len(), 2);
    assert_eq!(other_hits.len(), 1);

    let deadline = Duration::from_millis(1900);
    assert!(limited_hits[1].duration_since(limited_hits[0]) >= deadline);
    assert!(other_hits[0].duration_since(limited_hits[0]) >= deadline);
}

#[tokio::test]
async fn test_panicking_check_still_records_result() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/explode">x</a><a href="/ok">ok</a>"#).await;
    mount_ok(&server, "/ok").await;

    let mut options = create_test_options(&format!("{}/", base));
    options.links_to_skip = LinksToSkip::Predicate(Arc::new(|url: &str| {
        if url.ends_with("/explode") {
            panic!("predicate failure");
        }
        false
    }));

    let report = ripple_check::check(options).await.unwrap();

    assert!(!report.passed);
    assert_eq!(report.links.len(), 3);
    assert_eq!(count_results(&report, "/explode"), 1);

    let exploded = find(&report, &format!("{}/explode", base));
    assert_eq!(exploded.state, LinkState::Broken);
    assert_eq!(exploded.status, 0);
    assert!(exploded.failure_details[0]
        .to_string()
        .contains("predicate failure"));
    assert_eq!(find(&report, &format!("{}/ok", base)).state, LinkState::Ok);
}

#[tokio::test]
async fn test_retry_errors_gives_up_after_count() {
    let server = MockServer::start().await;
    let base = server.uri();

    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead_url = format!("http://127.0.0.1:{}/", closed.local_addr().unwrap().port());
    drop(closed);

    mount_page(&server, "/", &format!(r#"<a href="{}">dead</a>"#, dead_url)).await;

    let mut options = create_test_options(&format!("{}/", base));
    options.retry_errors = true;
    options.retry_errors_count = 1;
    options.retry_errors_jitter = 0;

    let (report, events) = check_with_events(options).await;

    assert!(!report.passed);
    let dead = find(&report, &dead_url);
    assert_eq!(dead.state, LinkState::Broken);
    assert_eq!(dead.status, 0);
    assert!(!dead.failure_details.is_empty());

    let retries = events
        .iter()
        .filter(|e| matches!(e, CrawlEvent::Retry { status: 0, .. }))
        .count();
    assert_eq!(retries, 1);
}

#[tokio::test]
async fn test_retry_errors_recovers_from_5xx() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<a href="/flaky">f</a>"#).await;
    Mock::given(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_ok(&server, "/flaky").await;

    let mut options = create_test_options(&format!("{}/", base));
    options.retry_errors = true;
    options.retry_errors_count = 2;
    options.retry_errors_jitter = 0;

    let report = ripple_check::check(options).await.unwrap();

    assert!(report.passed);
    assert_eq!(find(&report, &format!("{}/flaky", base)).status, 200);
}

#[tokio::test]
async fn test_fragment_checking() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r##"<a href="/page#exists">ok</a><a href="/page#missing">bad</a>"##,
    )
    .await;
    mount_page(&server, "/page", r#"<h2 id="exists">Here</h2>"#).await;

    let mut options = create_test_options(&format!("{}/", base));
    options.check_fragments = true;

    let report = ripple_check::check(options).await.unwrap();

    assert!(!report.passed);
    assert_eq!(
        find(&report, &format!("{}/page#exists", base)).state,
        LinkState::Ok
    );

    let missing = find(&report, &format!("{}/page#missing", base));
    assert_eq!(missing.state, LinkState::Broken);
    assert!(missing
        .failure_details
        .iter()
        .any(|d| d.to_string() == "Fragment identifier '#missing' not found on page"));
}

#[tokio::test]
async fn test_fragment_only_links_ignored_by_default() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r##"<a href="#nowhere">self</a>"##).await;

    let report = ripple_check::check(create_test_options(&format!("{}/", base)))
        .await
        .unwrap();
    assert_eq!(report.links.len(), 1);
    assert!(report.passed);
}

async fn mount_redirect(server: &MockServer) {
    Mock::given(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(server)
        .await;
    mount_ok(server, "/new").await;
}

#[tokio::test]
async fn test_redirects_error_mode() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", r#"<a href="/old">old</a>"#).await;
    mount_redirect(&server).await;

    let mut options = create_test_options(&format!("{}/", base));
    options.redirects = RedirectMode::Error;

    let report = ripple_check::check(options).await.unwrap();

    assert!(!report.passed);
    let old = find(&report, &format!("{}/old", base));
    assert_eq!(old.state, LinkState::Broken);
    assert_eq!(old.status, 301);
    assert!(old
        .failure_details
        .iter()
        .any(|d| d.to_string().contains("redirects are disabled")));
}

#[tokio::test]
async fn test_redirects_allow_mode() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", r#"<a href="/old">old</a>"#).await;
    mount_redirect(&server).await;

    let (report, events) = check_with_events(create_test_options(&format!("{}/", base))).await;

    assert!(report.passed);
    let old = find(&report, &format!("{}/old", base));
    assert_eq!(old.state, LinkState::Ok);
    assert_eq!(old.status, 200);
    assert!(!events.iter().any(|e| matches!(e, CrawlEvent::Redirect { .. })));
}

#[tokio::test]
async fn test_redirects_warn_mode() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", r#"<a href="/old">old</a>"#).await;
    mount_redirect(&server).await;

    let mut options = create_test_options(&format!("{}/", base));
    options.redirects = RedirectMode::Warn;

    let (report, events) = check_with_events(options).await;

    assert!(report.passed);
    assert!(events.iter().any(|e| matches!(
        e,
        CrawlEvent::Redirect { target_url, .. } if target_url == &format!("{}/new", base)
    )));
}

#[tokio::test]
async fn test_require_https_warn() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", r#"<a href="/plain">plain</a>"#).await;
    mount_ok(&server, "/plain").await;

    let mut options = create_test_options(&format!("{}/", base));
    options.require_https = HttpsMode::Warn;

    let (report, events) = check_with_events(options).await;

    assert!(report.passed);
    let insecure = events
        .iter()
        .filter(|e| matches!(e, CrawlEvent::HttpInsecure { .. }))
        .count();
    assert_eq!(insecure, 2);
}

#[tokio::test]
async fn test_require_https_error() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", "no links").await;

    let mut options = create_test_options(&format!("{}/", base));
    options.require_https = HttpsMode::Error;

    let report = ripple_check::check(options).await.unwrap();

    assert!(!report.passed);
    assert_eq!(report.links[0].status, 200);
    assert_eq!(report.links[0].state, LinkState::Broken);
}

#[tokio::test]
async fn test_url_rewrite() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", r#"<a href="https://old.example.invalid/moved">m</a>"#).await;
    mount_ok(&server, "/moved").await;

    let mut options = create_test_options(&format!("{}/", base));
    options.url_rewrite_expressions.push(UrlRewrite {
        pattern: "^https://old\\.example\\.invalid".to_string(),
        replacement: base.clone(),
    });

    let report = ripple_check::check(options).await.unwrap();

    assert!(report.passed);
    assert_eq!(find(&report, &format!("{}/moved", base)).state, LinkState::Ok);
}

#[tokio::test]
async fn test_extra_headers_and_user_agent() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("x-token", "secret"))
        .and(header("user-agent", "TestBot/1.0"))
        .respond_with(html("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let mut options = create_test_options(&format!("{}/", base));
    options.user_agent = Some("TestBot/1.0".to_string());
    options
        .extra_headers
        .insert("x-token".to_string(), "secret".to_string());

    let report = ripple_check::check(options).await.unwrap();
    assert!(report.passed);
}

#[tokio::test]
async fn test_unresolvable_link_is_broken() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", r#"<a href="http://[oops">bad</a>"#).await;

    let report = ripple_check::check(create_test_options(&format!("{}/", base)))
        .await
        .unwrap();

    assert!(!report.passed);
    let bad = find(&report, "http://[oops");
    assert_eq!(bad.state, LinkState::Broken);
    assert_eq!(bad.status, 0);
}

#[tokio::test]
async fn test_events_match_results() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", r#"<a href="/a">a</a><a href="/b">b</a>"#).await;
    mount_ok(&server, "/a").await;
    mount_ok(&server, "/b").await;

    let (report, events) = check_with_events(create_test_options(&format!("{}/", base))).await;

    let links: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            CrawlEvent::Link(link) => Some(link.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(links, report.links);
    assert!(events
        .iter()
        .any(|e| matches!(e, CrawlEvent::PageStart { url } if url == &format!("{}/", base))));
}

#[tokio::test]
async fn test_invalid_options_abort_before_crawling() {
    let result = ripple_check::check(CheckOptions::default()).await;
    assert!(matches!(result, Err(CheckError::Config(_))));

    let mut options = create_test_options("https://example.com/");
    options.concurrency = 0;
    assert!(matches!(
        ripple_check::check(options).await,
        Err(CheckError::Config(_))
    ));

    let mixed = CheckOptions::with_paths(["https://example.com/", "tests/fixtures/relative"]);
    assert!(matches!(
        ripple_check::check(mixed).await,
        Err(CheckError::Config(_))
    ));
}
