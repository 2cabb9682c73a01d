//! Crawler coordinator - the scope-bounded crawl loop
//!
//! This module drives the frontier: it pulls URLs breadth-first, fetches
//! them through the shared [`Client`], filters extracted links through the
//! scope guard and hands pages to the caller one at a time.

use crate::crawler::frontier::Frontier;
use crate::crawler::state::{CrawlStats, SkipReason, UrlState};
use crate::crawler::{Client, Page};
use crate::url::{canonical_key, is_in_scope, ScopeSpec};
use crate::ScanError;
use futures::stream::{self, Stream};
use std::collections::HashMap;
use url::Url;

/// Lazy, finite crawl over one target
///
/// Pages are produced on demand by [`Crawler::next_page`]. The sequence
/// is fused: once it has ended (or aborted) every further call returns
/// `Ok(None)` without touching the network.
pub struct Crawler {
    client: Client,
    scope: ScopeSpec,
    frontier: Frontier,
    states: HashMap<String, UrlState>,
    stats: CrawlStats,
    finished: bool,
}

impl Crawler {
    /// Creates a crawler seeded with `seed`
    ///
    /// # Arguments
    ///
    /// * `seed` - The normalized start URL
    /// * `client` - The client (and cookie session) to fetch with
    /// * `scope` - The hosts the crawl may visit
    pub fn new(seed: Url, client: Client, scope: ScopeSpec) -> Self {
        let mut crawler = Self {
            client,
            scope,
            frontier: Frontier::new(),
            states: HashMap::new(),
            stats: CrawlStats::default(),
            finished: false,
        };
        crawler.enqueue(seed);
        crawler
    }

    /// Fetches until the next page is available
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Page))` - The next in-scope page
    /// * `Ok(None)` - The frontier is exhausted
    /// * `Err(ScanError::Transport)` - A transport failure ended the crawl;
    ///   returned once, later calls yield `Ok(None)`
    pub async fn next_page(&mut self) -> Result<Option<Page>, ScanError> {
        if self.finished {
            return Ok(None);
        }

        while let Some(url) = self.frontier.pop_unvisited() {
            let key = canonical_key(&url);
            self.transition(&key, UrlState::Fetching);

            match self.client.get(&url).await {
                Ok(page) => {
                    let final_key = canonical_key(page.final_url());
                    if final_key != key && !self.frontier.claim(page.final_url()) {
                        tracing::debug!("{} redirected to visited {}", url, page.final_url());
                        self.transition(&key, UrlState::Skipped);
                        self.stats.record_skip(SkipReason::AlreadyVisited);
                        continue;
                    }

                    self.transition(&key, UrlState::Yielded);
                    if final_key != key {
                        self.states.insert(final_key, UrlState::Yielded);
                    }

                    self.enqueue_links(&page);
                    self.stats.pages_yielded += 1;
                    tracing::info!("Yielding page {} [{}]", page.final_url(), page.status_code());
                    return Ok(Some(page));
                }
                Err(err) => match SkipReason::from_error(&err) {
                    Some(reason) => {
                        tracing::warn!("Skipping {}: {}", url, err);
                        self.transition(&key, UrlState::Skipped);
                        self.stats.record_skip(reason);
                    }
                    None => {
                        tracing::error!("Aborting crawl at {}: {}", url, err);
                        self.transition(&key, UrlState::Aborted);
                        self.stats.aborted = true;
                        self.finished = true;
                        return Err(err.into());
                    }
                },
            }
        }

        tracing::info!(
            "Crawl finished: {} pages, {} skipped",
            self.stats.pages_yielded,
            self.stats.total_skipped()
        );
        self.finished = true;
        Ok(None)
    }

    /// Number of pages yielded so far
    pub fn pages_yielded(&self) -> usize {
        self.stats.pages_yielded
    }

    /// Snapshot of the crawl counters
    pub fn stats(&self) -> CrawlStats {
        CrawlStats {
            visited: self.frontier.visited_count(),
            frontier_len: self.frontier.len(),
            ..self.stats.clone()
        }
    }

    /// Lifecycle state of a URL, if the crawl has seen it
    pub fn state_of(&self, url: &Url) -> Option<UrlState> {
        self.states.get(&canonical_key(url)).copied()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Adapts the crawler into a stream of pages
    ///
    /// The stream ends after the frontier is exhausted or right after the
    /// transport error item.
    pub fn into_stream(self) -> impl Stream<Item = Result<Page, ScanError>> {
        stream::unfold(self, |mut crawler| async move {
            match crawler.next_page().await {
                Ok(Some(page)) => Some((Ok(page), crawler)),
                Ok(None) => None,
                Err(err) => Some((Err(err), crawler)),
            }
        })
    }

    fn enqueue_links(&mut self, page: &Page) {
        for link in page.outbound_links() {
            if !is_in_scope(link, &self.scope) {
                tracing::debug!("Out of scope: {}", link);
                continue;
            }
            self.enqueue(link.clone());
        }
    }

    fn enqueue(&mut self, url: Url) {
        let key = canonical_key(&url);
        if self.frontier.push(url) {
            self.states.entry(key).or_insert(UrlState::Pending);
        }
    }

    fn transition(&mut self, key: &str, next: UrlState) {
        let current = self.states.get(key).copied().unwrap_or(UrlState::Pending);
        if !current.can_transition_to(next) {
            tracing::warn!("Unexpected state change for {}: {} -> {}", key, current, next);
        }
        self.states.insert(key.to_string(), next);
    }
}
