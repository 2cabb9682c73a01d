//! Scaner: a scope-bounded web vulnerability scanner
//!
//! This crate crawls a target site without leaving its scope, detects the
//! technologies it runs on, and dispatches a registry of attack probes
//! against every discovered page, producing CSV and HTML reports.

pub mod attacks;
pub mod cancel;
pub mod config;
pub mod crawler;
pub mod output;
pub mod scan;
pub mod url;

use thiserror::Error;

/// Main error type for scan operations
///
/// Only `Transport` and `Interrupted` are expected to unwind out of a
/// running crawl; every other fetch outcome is handled where it occurs.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Transport failure for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Fetch error: {0}")]
    Fetch(crawler::FetchError),

    #[error("Scan interrupted")]
    Interrupted,

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Report error: {0}")]
    Report(#[from] output::ReportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// Returns true if this error must stop the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Interrupted)
    }
}

impl From<crawler::FetchError> for ScanError {
    fn from(err: crawler::FetchError) -> Self {
        match err {
            crawler::FetchError::Transport { url, message } => Self::Transport { url, message },
            other => Self::Fetch(other),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid login argument: {0}")]
    InvalidAuth(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for scan operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use attacks::{all_attacks, Attack, AttackEngine};
pub use cancel::Cancellation;
pub use config::Config;
pub use crawler::{Client, Crawler, FetchError, Page};
pub use output::{AttackResult, Log};
pub use url::{is_in_scope, normalize_url, ScopeSpec};
