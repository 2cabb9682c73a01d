//! Configuration module for Scaner
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Every key has a default, so a scan can run without
//! any file at all.
//!
//! # Example
//!
//! ```no_run
//! use scaner::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scaner.toml")).unwrap();
//! println!("Request timeout: {}s", config.client.timeout_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{AttacksConfig, ClientConfig, Config, CrawlerConfig, DEFAULT_NON_PAGE_CONTENT_TYPES};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
