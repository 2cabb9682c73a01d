//! Scope guard deciding which hosts the crawler may visit

use std::collections::HashSet;
use url::Url;

use super::extract_host;
use crate::UrlError;

/// The set of hosts a crawl is allowed to touch
///
/// Built once from the seed URL plus the user's whitelist and never
/// modified afterwards. Hosts are stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSpec {
    seed_host: String,
    whitelist_hosts: HashSet<String>,
}

impl ScopeSpec {
    /// Creates a scope from the seed URL and extra whitelisted hosts
    ///
    /// Whitelist entries are trimmed and lowercased; empty entries are
    /// dropped.
    pub fn new<I, S>(seed: &Url, whitelist: I) -> Result<Self, UrlError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let seed_host = extract_host(seed).ok_or(UrlError::MissingHost)?;
        let whitelist_hosts = whitelist
            .into_iter()
            .map(|h| h.as_ref().trim().to_lowercase())
            .filter(|h| !h.is_empty())
            .collect();

        Ok(Self {
            seed_host,
            whitelist_hosts,
        })
    }

    pub fn seed_host(&self) -> &str {
        &self.seed_host
    }

    pub fn whitelist_hosts(&self) -> &HashSet<String> {
        &self.whitelist_hosts
    }
}

/// Returns true if the candidate URL may be visited
///
/// A URL is in scope when its host equals the seed host or one of the
/// whitelisted hosts. The comparison is exact and case-insensitive: there
/// is no subdomain or wildcard matching, and the port is ignored.
pub fn is_in_scope(candidate: &Url, allowed: &ScopeSpec) -> bool {
    match extract_host(candidate) {
        Some(host) => host == allowed.seed_host || allowed.whitelist_hosts.contains(&host),
        None => false,
    }
}
