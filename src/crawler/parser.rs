//! HTML parser for extracting links and anchors
//!
//! This module handles parsing HTML content to extract:
//! - Every URL-bearing attribute worth checking
//! - The document base (`<base href>`) used to resolve them
//! - Fragment targets (`id` attributes and `<a name>`)

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// A link found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLink {
    /// The attribute value as written in the page
    pub original: String,

    /// The absolute URL, or `None` when the value could not be resolved
    pub resolved: Option<Url>,
}

/// Element/attribute pairs that carry a single URL
const URL_ATTRIBUTES: &[(&str, &str)] = &[
    ("a[href]", "href"),
    ("area[href]", "href"),
    ("link[href]", "href"),
    ("img[src]", "src"),
    ("script[src]", "src"),
    ("iframe[src]", "src"),
    ("frame[src]", "src"),
    ("embed[src]", "src"),
    ("source[src]", "src"),
    ("track[src]", "src"),
    ("audio[src]", "src"),
    ("video[src]", "src"),
    ("video[poster]", "poster"),
    ("input[src]", "src"),
    ("object[data]", "data"),
    ("blockquote[cite]", "cite"),
    ("q[cite]", "cite"),
    ("del[cite]", "cite"),
    ("ins[cite]", "cite"),
    ("body[background]", "background"),
];

/// Element selectors whose `srcset` carries candidate URLs
const SRCSET_SELECTORS: &[&str] = &["img[srcset]", "source[srcset]"];

/// Extracts every link from an HTML document
///
/// # Link Extraction Rules
///
/// - Relative values resolve against `<base href>` when present, otherwise
///   against `base_url`
/// - Every candidate of a `srcset` is reported
/// - `<meta http-equiv="refresh">` targets are reported
/// - Empty values are ignored; anything else is reported, including
///   `mailto:` and `javascript:` links, so the caller can classify them
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The URL the document was served from
///
/// # Example
///
/// ```
/// use ripple_check::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/page">Link</a><img src="logo.png">"#;
/// let base_url = Url::parse("https://example.com/docs/").unwrap();
/// let links = extract_links(html, &base_url);
/// assert_eq!(links.len(), 2);
/// assert_eq!(links[1].resolved.as_ref().unwrap().as_str(), "https://example.com/docs/logo.png");
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<ParsedLink> {
    let document = Html::parse_document(html);
    let base = document_base(&document, base_url);
    let mut links = Vec::new();

    for (selector, attribute) in URL_ATTRIBUTES {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        for element in document.select(&selector) {
            if let Some(value) = element.value().attr(attribute) {
                push_link(&mut links, value, &base);
            }
        }
    }

    for selector in SRCSET_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        for element in document.select(&selector) {
            if let Some(srcset) = element.value().attr("srcset") {
                for candidate in srcset_urls(srcset) {
                    push_link(&mut links, candidate, &base);
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse("meta[http-equiv][content]") {
        for element in document.select(&selector) {
            if let Some(target) = meta_refresh_target(element) {
                push_link(&mut links, target, &base);
            }
        }
    }

    links
}

/// Collects every fragment target on a page
///
/// Both `id` attributes and `<a name>` anchors count.
pub fn extract_fragment_ids(html: &str) -> HashSet<String> {
    let document = Html::parse_document(html);
    let mut ids = HashSet::new();

    if let Ok(selector) = Selector::parse("[id]") {
        for element in document.select(&selector) {
            if let Some(id) = element.value().attr("id") {
                ids.insert(id.to_string());
            }
        }
    }

    if let Ok(selector) = Selector::parse("a[name]") {
        for element in document.select(&selector) {
            if let Some(name) = element.value().attr("name") {
                ids.insert(name.to_string());
            }
        }
    }

    ids
}

/// Returns the effective base URL of a document
fn document_base(document: &Html, page_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|element| element.value().attr("href"))
                .and_then(|href| page_url.join(href.trim()).ok())
        })
        .unwrap_or_else(|| page_url.clone())
}

fn push_link(links: &mut Vec<ParsedLink>, value: &str, base: &Url) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    links.push(ParsedLink {
        original: value.to_string(),
        resolved: base.join(value).ok(),
    });
}

/// Splits a `srcset` into its URLs, dropping width/density descriptors
fn srcset_urls(srcset: &str) -> impl Iterator<Item = &str> {
    srcset
        .split(',')
        .filter_map(|candidate| candidate.split_whitespace().next())
}

/// Extracts the URL from `<meta http-equiv="refresh" content="0; url=...">`
fn meta_refresh_target(element: ElementRef<'_>) -> Option<&str> {
    let equiv = element.value().attr("http-equiv")?;
    if !equiv.eq_ignore_ascii_case("refresh") {
        return None;
    }

    let content = element.value().attr("content")?;
    let (_, rest) = content.split_once(';')?;
    let rest = rest.trim();
    let (key, target) = rest.split_once('=')?;
    if !key.trim().eq_ignore_ascii_case("url") {
        return None;
    }

    Some(target.trim().trim_matches(|c| c == '\'' || c == '"'))
}
