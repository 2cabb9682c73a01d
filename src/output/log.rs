//! Append-only log of visited URLs and probe results

use crate::output::{render_csv, render_html, ReportMeta, ReportResult};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

/// Outcome of one probe against one page
///
/// Only created when the probe found something or failed; a clean run
/// leaves no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackResult {
    pub attack_name: String,
    pub page_url: String,
    pub finding: Option<String>,
    pub error: Option<String>,
}

impl AttackResult {
    pub fn finding(attack_name: &str, page_url: &str, finding: impl Into<String>) -> Self {
        Self {
            attack_name: attack_name.to_string(),
            page_url: page_url.to_string(),
            finding: Some(finding.into()),
            error: None,
        }
    }

    pub fn error(attack_name: &str, page_url: &str, error: impl Into<String>) -> Self {
        Self {
            attack_name: attack_name.to_string(),
            page_url: page_url.to_string(),
            finding: None,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A scanned URL and its console annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlEntry {
    pub url: String,
    pub annotation: String,
}

#[derive(Debug, Default)]
struct LogState {
    urls: Vec<UrlEntry>,
    results: Vec<AttackResult>,
}

/// The scan's result sink
///
/// Shared by reference between the orchestrator and every probe. Entries
/// are only ever appended.
#[derive(Debug, Default)]
pub struct Log {
    inner: Mutex<LogState>,
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking probe must not make the log unusable for reporting
    fn state(&self) -> MutexGuard<'_, LogState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a scanned URL
    pub fn add_url(&self, url: &Url, annotation: &str) {
        self.state().urls.push(UrlEntry {
            url: url.to_string(),
            annotation: annotation.to_string(),
        });
    }

    pub fn add_result(&self, result: AttackResult) {
        if let Some(finding) = &result.finding {
            tracing::warn!("[{}] {}: {}", result.attack_name, result.page_url, finding);
        }
        self.state().results.push(result);
    }

    /// Records a vulnerability or notable observation
    pub fn add_finding(&self, attack_name: &str, page_url: &str, finding: impl Into<String>) {
        self.add_result(AttackResult::finding(attack_name, page_url, finding));
    }

    /// Records a probe failure
    pub fn add_error(&self, attack_name: &str, page_url: &str, error: impl Into<String>) {
        self.add_result(AttackResult::error(attack_name, page_url, error));
    }

    pub fn urls(&self) -> Vec<UrlEntry> {
        self.state().urls.clone()
    }

    pub fn results(&self) -> Vec<AttackResult> {
        self.state().results.clone()
    }

    pub fn findings(&self) -> Vec<AttackResult> {
        self.state()
            .results
            .iter()
            .filter(|r| r.finding.is_some())
            .cloned()
            .collect()
    }

    pub fn errors(&self) -> Vec<AttackResult> {
        self.state()
            .results
            .iter()
            .filter(|r| r.is_error())
            .cloned()
            .collect()
    }

    /// Writes the CSV report
    pub fn write_report(&self, path: &Path) -> ReportResult<()> {
        let (urls, results) = {
            let state = self.state();
            (state.urls.clone(), state.results.clone())
        };
        render_csv(path, &urls, &results)?;
        tracing::info!("CSV report written to {}", path.display());
        Ok(())
    }

    /// Writes the HTML report
    pub fn write_html_report(&self, path: &Path, meta: &ReportMeta) -> ReportResult<()> {
        let html = {
            let state = self.state();
            render_html(meta, &state.urls, &state.results)
        };
        std::fs::write(path, html)?;
        tracing::info!("HTML report written to {}", path.display());
        Ok(())
    }
}
