//! Passive check for missing security headers

use crate::attacks::{AttackError, AttackFuture};
use crate::crawler::{Client, Page};
use crate::output::Log;
use futures::FutureExt;

const NAME: &str = "security_headers";

const REQUIRED_HEADERS: &[(&str, &str)] = &[
    ("x-frame-options", "clickjacking protection"),
    ("x-content-type-options", "MIME sniffing protection"),
    ("content-security-policy", "content injection mitigation"),
];

pub(crate) fn run<'a>(page: &'a Page, _client: &'a Client, log: &'a Log) -> AttackFuture<'a> {
    async move {
        for issue in missing_headers(page) {
            log.add_finding(NAME, page.final_url().as_str(), issue);
        }
        Ok::<(), AttackError>(())
    }
    .boxed()
}

/// Lists the security headers the page does not send
pub(crate) fn missing_headers(page: &Page) -> Vec<String> {
    let mut missing: Vec<String> = REQUIRED_HEADERS
        .iter()
        .filter(|(name, _)| page.header(name).is_none())
        .map(|(name, purpose)| format!("Missing {} header ({})", name, purpose))
        .collect();

    if page.final_url().scheme() == "https" && page.header("strict-transport-security").is_none() {
        missing.push("Missing strict-transport-security header on HTTPS page".to_string());
    }

    missing
}
