//! HTML report rendering

use crate::output::{AttackResult, UrlEntry};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::time::Duration;

/// Scan metadata shown at the top of the HTML report
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub date: DateTime<Local>,
    pub url: String,
    pub host: String,
    pub scan_time: Duration,
    /// Detected technologies grouped by category
    pub detected_apps: BTreeMap<String, Vec<String>>,
    pub outcome: String,
    pub pages_scanned: usize,
    pub config_hash: Option<String>,
}

impl ReportMeta {
    /// Creates metadata for a scan of `url` started now
    pub fn new(url: &str, host: &str) -> Self {
        Self {
            date: Local::now(),
            url: url.to_string(),
            host: host.to_string(),
            scan_time: Duration::ZERO,
            detected_apps: BTreeMap::new(),
            outcome: "completed".to_string(),
            pages_scanned: 0,
            config_hash: None,
        }
    }
}

/// Formats a duration as `H:MM:SS`, rounded to whole seconds
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs() + u64::from(duration.subsec_millis() >= 500);
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Escapes text for use in HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders the full HTML report
pub fn render_html(meta: &ReportMeta, urls: &[UrlEntry], results: &[AttackResult]) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>Scan report: {}</title>\n", escape_html(&meta.host)));
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>Scan report: {}</h1>\n", escape_html(&meta.host)));

    // Metadata
    html.push_str("<h2>Audit information</h2>\n<table>\n");
    let mut rows = vec![
        ("Date", meta.date.format("%Y-%m-%d %H:%M:%S").to_string()),
        ("URL", meta.url.clone()),
        ("Host", meta.host.clone()),
        ("Scan time", format_duration(meta.scan_time)),
        ("Outcome", meta.outcome.clone()),
        ("Pages scanned", meta.pages_scanned.to_string()),
    ];
    if let Some(hash) = &meta.config_hash {
        rows.push(("Config SHA-256", hash.clone()));
    }
    for (label, value) in rows {
        html.push_str(&format!("<tr><th>{}</th><td>{}</td></tr>\n", label, escape_html(&value)));
    }
    html.push_str("</table>\n");

    // Technologies
    html.push_str("<h2>Detected technologies</h2>\n");
    if meta.detected_apps.is_empty() {
        html.push_str("<p>None detected.</p>\n");
    } else {
        html.push_str("<table>\n");
        for (category, apps) in &meta.detected_apps {
            html.push_str(&format!(
                "<tr><th>{}</th><td>{}</td></tr>\n",
                escape_html(category),
                escape_html(&apps.join(", "))
            ));
        }
        html.push_str("</table>\n");
    }

    // Findings
    let findings: Vec<&AttackResult> = results.iter().filter(|r| r.finding.is_some()).collect();
    html.push_str(&format!("<h2>Findings ({})</h2>\n", findings.len()));
    if !findings.is_empty() {
        html.push_str("<table>\n<tr><th>Attack</th><th>URL</th><th>Detail</th></tr>\n");
        for result in findings {
            html.push_str(&format!(
                "<tr class=\"finding\"><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(&result.attack_name),
                escape_html(&result.page_url),
                escape_html(result.finding.as_deref().unwrap_or_default())
            ));
        }
        html.push_str("</table>\n");
    }

    // Probe errors
    let errors: Vec<&AttackResult> = results.iter().filter(|r| r.error.is_some()).collect();
    if !errors.is_empty() {
        html.push_str(&format!("<h2>Probe errors ({})</h2>\n", errors.len()));
        html.push_str("<table>\n<tr><th>Attack</th><th>URL</th><th>Error</th></tr>\n");
        for result in errors {
            html.push_str(&format!(
                "<tr class=\"error\"><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(&result.attack_name),
                escape_html(&result.page_url),
                escape_html(result.error.as_deref().unwrap_or_default())
            ));
        }
        html.push_str("</table>\n");
    }

    // Visited URLs
    html.push_str(&format!("<h2>Scanned URLs ({})</h2>\n<ul>\n", urls.len()));
    for entry in urls {
        let url = escape_html(&entry.url);
        html.push_str(&format!(
            "<li><a href=\"{url}\">{url}</a> <span class=\"status\">{}</span></li>\n",
            escape_html(&entry.annotation)
        ));
    }
    html.push_str("</ul>\n</body>\n</html>\n");

    html
}

const STYLE: &str = "<style>\n\
body { font-family: sans-serif; margin: 2em; }\n\
table { border-collapse: collapse; margin-bottom: 1em; }\n\
th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: left; }\n\
tr.finding td { background: #fdecea; }\n\
tr.error td { background: #fff8e1; }\n\
span.status { color: #2e7d32; }\n\
</style>\n";
