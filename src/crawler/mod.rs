//! Crawler module for page fetching and traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with response classification
//! - HTML parsing and link extraction
//! - The breadth-first frontier and URL lifecycle
//! - The scope-bounded crawl loop

mod coordinator;
mod fetcher;
mod frontier;
mod page;
mod parser;
mod state;

pub use coordinator::Crawler;
pub use fetcher::{Client, FetchError, Session};
pub use frontier::Frontier;
pub use page::Page;
pub use parser::{parse_html, ParsedPage};
pub use state::{CrawlStats, SkipReason, UrlState};
