use crate::UrlError;
use url::Url;

/// Normalizes a URL according to Scaner's normalization rules
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not http or https
/// 3. Reject URLs without a host
/// 4. Lowercase scheme and host, drop the default port, resolve dot
///    segments and turn an empty path into `/` (done by the parser)
/// 5. Remove the fragment
///
/// The query string is kept verbatim: attack probes depend on parameter
/// order and values, so two URLs that differ only in their query are
/// distinct pages.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use scaner::url::normalize_url;
///
/// let url = normalize_url("HTTP://Example.COM:80/a/../b?x=1#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/b?x=1");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    canonicalize(url)
}

/// Applies the normalization rules to an already parsed URL
pub(crate) fn canonicalize(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    // "http://host/?" and "http://host/" are the same resource
    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

/// Returns the identity used for deduplication
///
/// Callers are expected to pass an already normalized URL; the key is
/// simply its serialization.
pub fn canonical_key(url: &Url) -> String {
    url.as_str().to_string()
}
