//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made by the scanner, including:
//! - Building the HTTP client with the configured user agent and limits
//! - Holding the cookie session shared by every request of a run
//! - GET and form POST requests
//! - Classifying responses into pages and the recoverable/fatal failures

use crate::config::Config;
use crate::crawler::page::Page;
use crate::url::canonicalize;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::RequestBuilder;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Why a fetch did not produce a page
///
/// Everything except `Transport` is recoverable: the URL is skipped and
/// the run goes on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// DNS, connect, TLS, timeout or body read failure
    #[error("Transport failure for {url}: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a 4xx or 5xx status
    #[error("Bad status code: {0}")]
    BadStatus(u16),

    /// The resource is static content rather than a webpage
    #[error("Not a page (content type {content_type})")]
    NotAPage { content_type: String },

    /// A redirect chain left the requested host
    #[error("Redirected to external location {location}")]
    ExternalRedirect { location: String },

    /// The redirect chain was too long or looped
    #[error("Redirect limit exceeded")]
    RedirectLimit,
}

impl FetchError {
    /// Returns true if this error must end the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// The cookie session of one scan run
///
/// Cookies set by any response (the login POST in particular) are sent
/// with every later request made through clients sharing this session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    jar: Arc<Jar>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the `Cookie` header value the session would send to `url`
    pub fn cookies_for(&self, url: &Url) -> Option<String> {
        self.jar
            .cookies(url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }
}

/// HTTP client bound to a cookie session
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    session: Session,
    non_page_types: Arc<HashSet<String>>,
}

impl Client {
    /// Creates a client with a fresh session
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Self::with_session(config, Session::new())
    }

    /// Creates a client that shares an existing session
    pub fn with_session(config: &Config, session: Session) -> Result<Self, reqwest::Error> {
        let http = build_http_client(config, &session)?;
        let non_page_types = config
            .crawler
            .non_page_content_types
            .iter()
            .map(|t| t.trim().to_lowercase())
            .collect();

        Ok(Self {
            http,
            session,
            non_page_types: Arc::new(non_page_types),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fetches a URL with GET
    pub async fn get(&self, url: &Url) -> Result<Page, FetchError> {
        self.get_with_headers(url, HeaderMap::new()).await
    }

    /// Fetches a URL with GET, adding extra request headers
    pub async fn get_with_headers(&self, url: &Url, headers: HeaderMap) -> Result<Page, FetchError> {
        tracing::debug!("GET {}", url);
        let request = self.http.get(url.clone()).headers(headers);
        self.execute(url, request).await
    }

    /// Submits a urlencoded form with POST
    pub async fn post(&self, url: &Url, form: &[(String, String)]) -> Result<Page, FetchError> {
        tracing::debug!("POST {} ({} fields)", url, form.len());
        let request = self.http.post(url.clone()).form(form);
        self.execute(url, request).await
    }

    async fn execute(&self, requested: &Url, request: RequestBuilder) -> Result<Page, FetchError> {
        let response = request
            .send()
            .await
            .map_err(|e| request_error(requested, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        classify(
            requested,
            &final_url,
            status,
            content_type.as_deref(),
            &self.non_page_types,
        )?;

        let body = response.bytes().await.map_err(|e| FetchError::Transport {
            url: final_url.to_string(),
            message: e.to_string(),
        })?;

        // Redirect targets may carry a fragment or an empty query
        let final_url = canonicalize(final_url.clone()).unwrap_or(final_url);

        Ok(Page::new(final_url, status, headers, body.to_vec()))
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed by reqwest up to `client.max-redirects` hops;
/// the session's cookie jar is installed as the cookie provider.
fn build_http_client(config: &Config, session: &Session) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(config.client.user_agent.as_str())
        .timeout(Duration::from_secs(config.client.timeout_secs))
        .connect_timeout(Duration::from_secs(config.client.connect_timeout_secs))
        .redirect(Policy::limited(config.client.max_redirects))
        .cookie_provider(Arc::clone(&session.jar))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Maps a send failure onto the fetch taxonomy
fn request_error(requested: &Url, err: reqwest::Error) -> FetchError {
    if err.is_redirect() {
        FetchError::RedirectLimit
    } else {
        FetchError::Transport {
            url: requested.to_string(),
            message: err.to_string(),
        }
    }
}

/// Strips parameters from a Content-Type value and lowercases it
fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Classifies a received response
///
/// # Classification order
///
/// 1. Status 4xx/5xx → `BadStatus`
/// 2. Content type in the non-page set → `NotAPage`
/// 3. Final host differs from the requested host → `ExternalRedirect`
///
/// A response without a Content-Type header counts as a page.
pub(crate) fn classify(
    requested: &Url,
    final_url: &Url,
    status: u16,
    content_type: Option<&str>,
    non_page_types: &HashSet<String>,
) -> Result<(), FetchError> {
    if (400..600).contains(&status) {
        return Err(FetchError::BadStatus(status));
    }

    if let Some(content_type) = content_type {
        if non_page_types.contains(&mime_essence(content_type)) {
            return Err(FetchError::NotAPage {
                content_type: content_type.to_string(),
            });
        }
    }

    let requested_host = requested.host_str().map(str::to_lowercase);
    let final_host = final_url.host_str().map(str::to_lowercase);
    if requested_host != final_host {
        return Err(FetchError::ExternalRedirect {
            location: final_url.to_string(),
        });
    }

    Ok(())
}
