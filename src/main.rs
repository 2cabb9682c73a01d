//! Scaner main entry point
//!
//! This is the command-line interface for the Scaner web vulnerability scanner.

use anyhow::Context;
use clap::{CommandFactory, Parser};
use scaner::attacks::select_attacks;
use scaner::config::{load_config_with_hash, Config};
use scaner::scan::{self, AuthData, ScanOptions, ScanOutcome};
use scaner::url::{extract_host, validate_target, ScopeSpec};
use scaner::Cancellation;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Scaner: a scope-bounded web vulnerability scanner
///
/// Scaner crawls a target site without leaving its host (plus any
/// whitelisted hosts), detects the technologies it runs on and runs its
/// attack probes against every page it finds. Results are written as CSV
/// and HTML reports.
#[derive(Parser, Debug)]
#[command(name = "scaner")]
#[command(version)]
#[command(about = "A scope-bounded web vulnerability scanner", long_about = None)]
struct Cli {
    /// Target URL (e.g. "http://www.target.com/page.php?id=1")
    #[arg(short, long)]
    url: Option<String>,

    /// Log in before scanning: URL fieldname=username fieldname=password
    #[arg(
        short = 'a',
        num_args = 3,
        value_names = ["LOGIN_URL", "USER_FIELD=USER", "PASS_FIELD=PASS"]
    )]
    auth: Option<Vec<String>>,

    /// Extra hosts the crawl may visit (comma separated)
    #[arg(short, long, value_delimiter = ',', value_name = "HOST,HOST...")]
    whitelist: Vec<String>,

    /// Scan the target page only
    #[arg(long = "pageonly")]
    page_only: bool,

    /// CSV report path (default audit_<host>.csv)
    #[arg(long = "csv", value_name = "FILE")]
    csv_file: Option<PathBuf>,

    /// HTML report path (default audit_<host>.html)
    #[arg(long = "html", value_name = "FILE")]
    html_file: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate settings and show what would be scanned without scanning
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let Some(url) = cli.url.clone() else {
        Cli::command().print_help()?;
        println!();
        return Ok(ExitCode::SUCCESS);
    };

    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    let auth = match cli.auth.as_deref() {
        Some([login_url, user, pass]) => Some(AuthData::from_args(login_url, user, pass)?),
        Some(_) => anyhow::bail!("-a takes exactly three values"),
        None => None,
    };

    let options = ScanOptions {
        url,
        auth,
        whitelist: cli.whitelist.clone(),
        page_only: cli.page_only,
        csv_path: cli.csv_file.clone(),
        html_path: cli.html_file.clone(),
    };

    if cli.dry_run {
        handle_dry_run(&options, &config)?;
        return Ok(ExitCode::SUCCESS);
    }

    let cancel = Cancellation::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing up");
            on_interrupt.cancel();
        }
    });

    let report = scan::run(options, config, config_hash, cancel).await?;

    tracing::info!(
        "Scan {} after {:?}: {} pages, reports {} and {}",
        report.outcome,
        report.elapsed,
        report.pages_scanned,
        report.csv_path.display(),
        report.html_path.display()
    );

    match report.outcome {
        ScanOutcome::Aborted(_) => Ok(ExitCode::FAILURE),
        ScanOutcome::Completed | ScanOutcome::Interrupted => Ok(ExitCode::SUCCESS),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("scaner=info,warn"),
            1 => EnvFilter::new("scaner=debug,info"),
            2 => EnvFilter::new("scaner=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates settings and shows the plan
fn handle_dry_run(options: &ScanOptions, config: &Config) -> anyhow::Result<()> {
    let target = validate_target(&options.url)?;
    let host = extract_host(&target).unwrap_or_default();
    let scope = ScopeSpec::new(&target, &options.whitelist)?;

    println!("=== Scaner Dry Run ===\n");
    println!("Target: {}", target);
    println!("Mode: {}", if options.page_only { "single page" } else { "crawl" });

    println!("\nScope:");
    println!("  Seed host: {}", scope.seed_host());
    let mut whitelist: Vec<&String> = scope.whitelist_hosts().iter().collect();
    whitelist.sort();
    for host in whitelist {
        println!("  Whitelisted: {}", host);
    }

    if let Some(auth) = &options.auth {
        println!("\nLogin: POST {} ({} fields)", auth.url, auth.fields.len());
    }

    println!("\nClient:");
    println!("  User agent: {}", config.client.user_agent);
    println!("  Timeout: {}s (connect {}s)", config.client.timeout_secs, config.client.connect_timeout_secs);
    println!("  Max redirects: {}", config.client.max_redirects);
    match config.crawler.max_pages {
        Some(max) => println!("  Page limit: {}", max),
        None => println!("  Page limit: none"),
    }

    let attacks = select_attacks(config.attacks.enabled.as_deref());
    println!("\nProbes ({}):", attacks.len());
    for attack in &attacks {
        println!("  - {}", attack.name);
    }

    println!(
        "\nReports: {} and {}",
        options.csv_path_for(&host).display(),
        options.html_path_for(&host).display()
    );

    Ok(())
}
