//! Immutable snapshot of a fetched HTML page

use crate::crawler::parser::parse_html;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use std::borrow::Cow;
use url::Url;

/// A successfully fetched page
///
/// Built once by the fetcher and never modified afterwards; probes get it
/// by shared reference.
#[derive(Debug, Clone)]
pub struct Page {
    final_url: Url,
    status_code: u16,
    headers: HeaderMap,
    body: Vec<u8>,
    title: Option<String>,
    outbound_links: Vec<Url>,
}

impl Page {
    /// Creates a page and extracts its outbound links
    ///
    /// Links are resolved against `final_url` (or the document's
    /// `<base href>`), normalized and deduplicated.
    pub fn new(final_url: Url, status_code: u16, headers: HeaderMap, body: Vec<u8>) -> Self {
        let parsed = parse_html(&String::from_utf8_lossy(&body), &final_url);

        Self {
            final_url,
            status_code,
            headers,
            body,
            title: parsed.title,
            outbound_links: parsed.links,
        }
    }

    /// The URL after redirects
    pub fn final_url(&self) -> &Url {
        &self.final_url
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Looks up a header value, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body decoded as UTF-8, invalid sequences replaced
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Links found on the page, in first occurrence order
    pub fn outbound_links(&self) -> &[Url] {
        &self.outbound_links
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}
