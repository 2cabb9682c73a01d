//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Links the crawler may follow (anchors, forms, frames, assets)
//! - The page title
//! - The effective base URL (`<base href>`)

use crate::url::normalize_url;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Element/attribute pairs that carry followable URLs
const LINK_SOURCES: &[(&str, &str)] = &[
    ("a[href]", "href"),
    ("area[href]", "href"),
    ("form[action]", "action"),
    ("iframe[src]", "src"),
    ("frame[src]", "src"),
    ("link[href]", "href"),
    ("script[src]", "src"),
    ("img[src]", "src"),
];

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Normalized absolute links, first occurrence order, no duplicates
    pub links: Vec<Url>,
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Extraction Rules
///
/// **Include:** `a`, `area`, `form[action]`, `iframe`, `frame`, `link`,
/// `script` and `img` references.
///
/// **Exclude:**
/// - empty and fragment-only references
/// - `javascript:`, `mailto:`, `tel:` and `data:` references
/// - anything that is not http(s) after resolution
///
/// Relative references resolve against `<base href>` when the document
/// has one, otherwise against `base_url`.
///
/// # Example
///
/// ```
/// use scaner::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links[0].as_str(), "https://example.com/page");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let base = document_base(&document, base_url);
    let title = extract_title(&document);
    let links = extract_links(&document, &base);

    ParsedPage { title, links }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Returns the URL relative references resolve against
fn document_base(document: &Html, page_url: &Url) -> Url {
    let Ok(selector) = Selector::parse("base[href]") else {
        return page_url.clone();
    };

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
        .unwrap_or_else(|| page_url.clone())
}

/// Extracts all followable links in document order
fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let selectors: Vec<(Selector, &str)> = LINK_SOURCES
        .iter()
        .filter_map(|(css, attr)| Selector::parse(css).ok().map(|s| (s, *attr)))
        .collect();

    // Walk the tree once so the output follows document order rather
    // than selector order
    for node in document.root_element().descendants() {
        let Some(element) = scraper::ElementRef::wrap(node) else {
            continue;
        };

        for (selector, attr) in &selectors {
            if !selector.matches(&element) {
                continue;
            }
            if let Some(url) = element.value().attr(attr).and_then(|v| resolve_link(v, base_url)) {
                if seen.insert(url.as_str().to_string()) {
                    links.push(url);
                }
            }
        }
    }

    links
}

/// Resolves a reference to a normalized absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only anchors
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    normalize_url(absolute.as_str()).ok()
}
