//! Scan orchestration
//!
//! Ties the pieces together for one target:
//! login → technology detection → CMS checks → crawl (or the single
//! target page) × attack engine → reports. The reports are written on
//! every exit path, including interruption and transport failure.

mod auth;

pub use auth::{authenticate, AuthData};

use crate::attacks::{app_detect, attack_cms, group_by_category, AttackEngine, AttackError, CMS_CATEGORY};
use crate::cancel::Cancellation;
use crate::config::Config;
use crate::crawler::{Client, Crawler, Page};
use crate::output::{Log, ReportMeta};
use crate::url::{extract_host, validate_target, ScopeSpec};
use crate::{ScanError, UrlError};
use chrono::Local;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use url::Url;

/// What to scan and where to write the results
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Target URL as given by the user
    pub url: String,
    pub auth: Option<AuthData>,
    /// Extra hosts the crawl may visit
    pub whitelist: Vec<String>,
    /// Scan the target page only, without crawling
    pub page_only: bool,
    /// CSV report path; `audit_<host>.csv` when absent
    pub csv_path: Option<PathBuf>,
    /// HTML report path; `audit_<host>.html` when absent
    pub html_path: Option<PathBuf>,
}

impl ScanOptions {
    /// CSV report path for a target host
    pub fn csv_path_for(&self, host: &str) -> PathBuf {
        self.csv_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("audit_{}.csv", host)))
    }

    /// HTML report path for a target host
    pub fn html_path_for(&self, host: &str) -> PathBuf {
        self.html_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("audit_{}.html", host)))
    }
}

/// How a scan ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed,
    Interrupted,
    /// Ended by a fatal error, with its description
    Aborted(String),
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Interrupted => write!(f, "interrupted"),
            Self::Aborted(reason) => write!(f, "aborted: {}", reason),
        }
    }
}

/// Summary of a finished scan
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub outcome: ScanOutcome,
    pub pages_scanned: usize,
    pub csv_path: PathBuf,
    pub html_path: PathBuf,
    pub detected_apps: BTreeMap<String, BTreeSet<String>>,
    pub elapsed: Duration,
    /// Report files that could not be written
    pub report_errors: Vec<String>,
}

/// Everything a running scan borrows
struct ScanContext<'a> {
    options: &'a ScanOptions,
    config: &'a Config,
    target: &'a Url,
    client: &'a Client,
    engine: &'a AttackEngine,
    log: &'a Log,
    cancel: &'a Cancellation,
}

#[derive(Debug, Default)]
struct Progress {
    detected_apps: BTreeMap<String, BTreeSet<String>>,
    pages_scanned: usize,
}

/// Runs a complete scan
///
/// # Arguments
///
/// * `options` - Target, login, scope and report paths
/// * `config` - Client, crawl and attack settings
/// * `config_hash` - Hash of the config file, stamped into the HTML report
/// * `cancel` - Trips when the user interrupts the scan
///
/// # Returns
///
/// * `Ok(ScanReport)` - The scan ran; see `outcome` for how it ended
/// * `Err(ScanError)` - The scan could not start (bad target, client setup)
pub async fn run(
    options: ScanOptions,
    config: Config,
    config_hash: Option<String>,
    cancel: Cancellation,
) -> Result<ScanReport, ScanError> {
    let date = Local::now();
    let started = Instant::now();

    let target = validate_target(&options.url)?;
    let host = extract_host(&target).ok_or(UrlError::MissingHost)?;
    let csv_path = options.csv_path_for(&host);
    let html_path = options.html_path_for(&host);

    let client = Client::new(&config)?;
    let scope = ScopeSpec::new(&target, &options.whitelist)?;
    let engine = AttackEngine::from_config(&config.attacks);
    let log = Log::new();

    tracing::info!("Scanning {} ({} probes)", target, engine.attacks().len());

    let ctx = ScanContext {
        options: &options,
        config: &config,
        target: &target,
        client: &client,
        engine: &engine,
        log: &log,
        cancel: &cancel,
    };
    let mut progress = Progress::default();

    let outcome = match scan_target(&ctx, scope, &mut progress).await {
        Ok(()) => ScanOutcome::Completed,
        Err(ScanError::Interrupted) => {
            println!("Interrupted");
            ScanOutcome::Interrupted
        }
        Err(err) => {
            tracing::error!("Scan aborted: {}", err);
            ScanOutcome::Aborted(err.to_string())
        }
    };

    let elapsed = started.elapsed();
    let meta = ReportMeta {
        date,
        url: target.to_string(),
        host,
        scan_time: elapsed,
        detected_apps: group_by_category(&progress.detected_apps),
        outcome: outcome.to_string(),
        pages_scanned: progress.pages_scanned,
        config_hash,
    };

    let mut report_errors = Vec::new();
    if let Err(e) = log.write_report(&csv_path) {
        tracing::error!("Failed to write CSV report {}: {}", csv_path.display(), e);
        report_errors.push(format!("{}: {}", csv_path.display(), e));
    }
    if let Err(e) = log.write_html_report(&html_path, &meta) {
        tracing::error!("Failed to write HTML report {}: {}", html_path.display(), e);
        report_errors.push(format!("{}: {}", html_path.display(), e));
    }

    println!("{}", progress.pages_scanned);

    Ok(ScanReport {
        outcome,
        pages_scanned: progress.pages_scanned,
        csv_path,
        html_path,
        detected_apps: progress.detected_apps,
        elapsed,
        report_errors,
    })
}

async fn scan_target(
    ctx: &ScanContext<'_>,
    scope: ScopeSpec,
    progress: &mut Progress,
) -> Result<(), ScanError> {
    if let Some(auth) = &ctx.options.auth {
        interruptible(ctx.cancel, authenticate(auth, ctx.client)).await??;
    }

    let apps = interruptible(ctx.cancel, app_detect(ctx.target, ctx.client)).await??;
    if !apps.is_empty() {
        println!("Detected technologies");
        for (app, categories) in &apps {
            let categories: Vec<&str> = categories.iter().map(String::as_str).collect();
            println!("{} - {}", categories.join(", "), app);
        }
    }
    let cms = apps
        .iter()
        .find(|(_, categories)| categories.contains(CMS_CATEGORY))
        .map(|(app, _)| app.clone());
    progress.detected_apps = apps;

    if let Some(cms) = cms {
        let result = interruptible(ctx.cancel, attack_cms(&cms, ctx.target, ctx.client, ctx.log)).await?;
        match result {
            Ok(()) => {}
            Err(AttackError::Fetch(err)) if err.is_fatal() => return Err(err.into()),
            Err(err) => ctx.log.add_error("cms", ctx.target.as_str(), err.to_string()),
        }
    }

    if ctx.options.page_only {
        match interruptible(ctx.cancel, ctx.client.get(ctx.target)).await? {
            Ok(page) => scan_page(ctx, &page, progress).await?,
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => tracing::warn!("{} is not scannable: {}", ctx.target, err),
        }
        return Ok(());
    }

    let mut crawler = Crawler::new(ctx.target.clone(), ctx.client.clone(), scope);
    loop {
        if ctx.cancel.is_cancelled() {
            return Err(ScanError::Interrupted);
        }
        if let Some(max_pages) = ctx.config.crawler.max_pages {
            if progress.pages_scanned >= max_pages {
                tracing::info!("Page limit of {} reached", max_pages);
                break;
            }
        }

        let Some(page) = interruptible(ctx.cancel, crawler.next_page()).await?? else {
            break;
        };
        scan_page(ctx, &page, progress).await?;
    }

    let stats = crawler.stats();
    tracing::info!(
        "Crawl stats: {} pages, {} skipped, {} visited",
        stats.pages_yielded,
        stats.total_skipped(),
        stats.visited
    );
    Ok(())
}

async fn scan_page(ctx: &ScanContext<'_>, page: &Page, progress: &mut Progress) -> Result<(), ScanError> {
    println!("Scanning: [{}] {}", page.status_code(), page.final_url());
    ctx.log.add_url(page.final_url(), &page.status_code().to_string());
    progress.pages_scanned += 1;

    interruptible(ctx.cancel, ctx.engine.run(page, ctx.client, ctx.log, ctx.cancel)).await?
}

/// Races `fut` against cancellation
async fn interruptible<F: std::future::Future>(
    cancel: &Cancellation,
    fut: F,
) -> Result<F::Output, ScanError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ScanError::Interrupted),
        output = fut => Ok(output),
    }
}
