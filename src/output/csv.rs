//! CSV report rendering

use crate::output::{AttackResult, ReportResult, UrlEntry};
use csv::Writer;
use std::path::Path;

/// Writes the CSV report
///
/// One row per scanned URL, then one row per finding and per probe error,
/// under a `kind,url,name,detail` header.
pub fn render_csv(path: &Path, urls: &[UrlEntry], results: &[AttackResult]) -> ReportResult<()> {
    let mut wtr = Writer::from_path(path)?;

    wtr.write_record(["kind", "url", "name", "detail"])?;

    for entry in urls {
        wtr.write_record(["url", entry.url.as_str(), "", entry.annotation.as_str()])?;
    }

    for result in results {
        if let Some(finding) = &result.finding {
            wtr.write_record([
                "finding",
                result.page_url.as_str(),
                result.attack_name.as_str(),
                finding.as_str(),
            ])?;
        }
        if let Some(error) = &result.error {
            wtr.write_record([
                "error",
                result.page_url.as_str(),
                result.attack_name.as_str(),
                error.as_str(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
