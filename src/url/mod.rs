//! URL handling module for Scaner
//!
//! This module provides URL normalization, host extraction and the scope
//! guard that decides which discovered URLs the crawler may visit.

mod domain;
mod normalize;
mod scope;

// Re-export main functions
pub use domain::{extract_host, validate_target};
pub use normalize::{canonical_key, normalize_url};
pub(crate) use normalize::canonicalize;
pub use scope::{is_in_scope, ScopeSpec};
