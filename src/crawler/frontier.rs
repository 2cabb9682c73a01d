//! Breadth-first frontier with a monotonic visited set

use crate::url::canonical_key;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// FIFO queue of URLs waiting to be fetched
///
/// The queue may hold duplicates; they are discarded when popped. The
/// visited set only ever grows, so a URL is handed out at most once.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<Url>,
    visited: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a URL unless it was already visited
    ///
    /// Returns true if the URL was queued.
    pub fn push(&mut self, url: Url) -> bool {
        if self.is_visited(&url) {
            return false;
        }
        self.queue.push_back(url);
        true
    }

    /// Pops the next URL that has not been visited and marks it visited
    pub fn pop_unvisited(&mut self) -> Option<Url> {
        while let Some(url) = self.queue.pop_front() {
            if self.claim(&url) {
                return Some(url);
            }
            tracing::debug!("Discarding already visited {}", url);
        }
        None
    }

    /// Marks a URL visited; returns false if it already was
    pub fn claim(&mut self, url: &Url) -> bool {
        self.visited.insert(canonical_key(url))
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(&canonical_key(url))
    }

    /// Number of queued entries, duplicates included
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
