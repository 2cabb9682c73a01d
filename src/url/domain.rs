use crate::UrlError;
use url::Url;

use super::normalize_url;

/// Extracts the host from a URL
///
/// The host is returned lowercase. URLs without a host (which a normalized
/// HTTP(S) URL never is) yield `None`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use scaner::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM:8443/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Turns a user-supplied target into a normalized seed URL
///
/// Targets given without a scheme (`example.com/app`) are assumed to be
/// plain http, which is what a browser would try first.
///
/// # Arguments
///
/// * `target` - The target as typed on the command line
///
/// # Returns
///
/// * `Ok(Url)` - The normalized seed URL
/// * `Err(UrlError)` - The target is not an http(s) URL with a host
pub fn validate_target(target: &str) -> Result<Url, UrlError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(UrlError::Parse("empty target".to_string()));
    }

    if target.contains("://") {
        normalize_url(target)
    } else {
        normalize_url(&format!("http://{}", target))
    }
}
