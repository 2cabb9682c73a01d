//! URL lifecycle tracking for a single crawl
//!
//! Every URL taken off the frontier goes through
//! `Pending → Fetching → {Yielded | Skipped | Aborted}`.

use crate::crawler::FetchError;
use std::collections::BTreeMap;
use std::fmt;

/// The current state of a URL in the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    /// Queued on the frontier, not fetched yet
    Pending,

    /// The request is in flight
    Fetching,

    /// Fetched as a page and handed to the consumer
    Yielded,

    /// Fetched but not a usable page (see [`SkipReason`])
    Skipped,

    /// The fetch failed at the transport level and ended the crawl
    Aborted,
}

impl UrlState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Yielded | Self::Skipped | Self::Aborted)
    }

    /// Returns true if moving from `self` to `next` is a valid transition
    pub fn can_transition_to(&self, next: UrlState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Fetching)
                | (Self::Fetching, Self::Yielded)
                | (Self::Fetching, Self::Skipped)
                | (Self::Fetching, Self::Aborted)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Yielded => "yielded",
            Self::Skipped => "skipped",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a fetched URL was not yielded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    BadStatus,
    NotAPage,
    ExternalRedirect,
    RedirectLimit,
    /// Redirected onto a URL that was already visited
    AlreadyVisited,
}

impl SkipReason {
    /// Maps a recoverable fetch error to its skip reason
    ///
    /// Returns `None` for transport failures, which abort instead.
    pub fn from_error(err: &FetchError) -> Option<Self> {
        match err {
            FetchError::BadStatus(_) => Some(Self::BadStatus),
            FetchError::NotAPage { .. } => Some(Self::NotAPage),
            FetchError::ExternalRedirect { .. } => Some(Self::ExternalRedirect),
            FetchError::RedirectLimit => Some(Self::RedirectLimit),
            FetchError::Transport { .. } => None,
        }
    }
}

/// Aggregate counters for one crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub pages_yielded: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
    pub aborted: bool,
    pub visited: usize,
    pub frontier_len: usize,
}

impl CrawlStats {
    pub fn record_skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped.values().sum()
    }
}
