use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{ALLOW, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use pulldown_cmark::{html, Options, Parser};
use std::convert::Infallible;
use std::fmt::Write;
use std::path::{Component, Path, PathBuf};
use tracing::trace;

/// What the local server serves and how
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// Directory served at `/`
    pub root: PathBuf,

    /// Render `.md` files to HTML
    pub markdown: bool,

    /// Generate listings for directories without an index.html
    pub directory_listing: bool,
}

const HTML: &str = "text/html; charset=utf-8";

pub(super) async fn handle_request(
    req: Request<Incoming>,
    options: &ServeOptions,
) -> Result<Response<Full<Bytes>>, Infallible> {
    trace!("{} {}", req.method(), req.uri().path());

    if req.method() != Method::GET && req.method() != Method::HEAD {
        return Ok(Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header(ALLOW, "GET, HEAD")
            .body(Full::new(Bytes::new()))
            .unwrap_or_else(|_| plain(StatusCode::METHOD_NOT_ALLOWED)));
    }

    let Some(path) = resolve_path(&options.root, req.uri().path()) else {
        return Ok(plain(StatusCode::NOT_FOUND));
    };

    Ok(serve_path(&path, req.uri().path(), options).await)
}

/// Maps a request path onto the served directory
///
/// Percent-escapes are decoded. Any `..` or absolute component is refused,
/// as is anything that canonicalizes outside the root.
fn resolve_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(request_path).ok()?;
    let relative = Path::new(decoded.trim_start_matches('/'));

    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    let candidate = root.join(relative).canonicalize().ok()?;
    candidate.starts_with(root).then_some(candidate)
}

async fn serve_path(path: &Path, request_path: &str, options: &ServeOptions) -> Response<Full<Bytes>> {
    if path.is_dir() {
        let index = path.join("index.html");
        if index.is_file() {
            return serve_file(&index, options).await;
        }
        if options.directory_listing {
            return match directory_listing(path, request_path).await {
                Ok(page) => respond(StatusCode::OK, HTML, page.into_bytes()),
                Err(_) => plain(StatusCode::INTERNAL_SERVER_ERROR),
            };
        }
        return plain(StatusCode::NOT_FOUND);
    }

    serve_file(path, options).await
}

async fn serve_file(path: &Path, options: &ServeOptions) -> Response<Full<Bytes>> {
    let contents = match tokio::fs::read(path).await {
        Ok(contents) => contents,
        Err(_) => return plain(StatusCode::NOT_FOUND),
    };

    let is_markdown = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("md"));

    if options.markdown && is_markdown {
        let page = render_markdown(&String::from_utf8_lossy(&contents));
        return respond(StatusCode::OK, HTML, page.into_bytes());
    }

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let content_type = if mime.type_().as_str() == "text" {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.essence_str().to_string()
    };

    respond(StatusCode::OK, &content_type, contents)
}

/// Renders markdown to a standalone HTML page
///
/// # Example
///
/// ```
/// use ripple_check::server::render_markdown;
///
/// let page = render_markdown("# Title\n\n[next](next.md)");
/// assert!(page.contains("<h1>Title</h1>"));
/// assert!(page.contains(r#"<a href="next.md">next</a>"#));
/// ```
pub fn render_markdown(source: &str) -> String {
    let mut body = String::new();
    html::push_html(&mut body, Parser::new_ext(source, Options::all()));

    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"></head><body>\n{}</body></html>\n",
        body
    )
}

async fn directory_listing(dir: &Path, request_path: &str) -> std::io::Result<String> {
    let mut entries = Vec::new();
    let mut reader = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = reader.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await?.is_dir() {
            name.push('/');
        }
        entries.push(name);
    }
    entries.sort();

    let title = escape_html(request_path);
    let mut page = format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Index of {0}</title></head>\n<body><h1>Index of {0}</h1>\n<ul>\n",
        title
    );
    for name in &entries {
        let _ = writeln!(
            page,
            "<li><a href=\"{}\">{}</a></li>",
            urlencoding::encode(name).replace("%2F", "/"),
            escape_html(name)
        );
    }
    page.push_str("</ul>\n</body></html>\n");

    Ok(page)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn respond(status: StatusCode, content_type: &str, body: Vec<u8>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| plain(StatusCode::INTERNAL_SERVER_ERROR))
}

fn plain(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(
        status.canonical_reason().unwrap_or("").to_string(),
    )));
    *response.status_mut() = status;
    response
}
