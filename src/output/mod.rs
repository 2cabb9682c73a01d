//! Output module for recording scan results and writing reports
//!
//! This module handles:
//! - The shared result log probes write findings into
//! - The CSV report
//! - The HTML report with scan metadata

mod csv;
mod html;
mod log;

pub use self::csv::render_csv;
pub use self::html::{escape_html, format_duration, render_html, ReportMeta};
pub use self::log::{AttackResult, Log, UrlEntry};

use thiserror::Error;

/// Errors that can occur while writing reports
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;
