//! CSV output of item match results.

use crate::error::Result;
use crate::matching::MatchReport;
use std::path::Path;
use tracing::info;

/// Write every recorded lookup to `records_path` and per-source counts to
/// `summary_path`.
pub fn write_match_report(report: &MatchReport, records_path: &Path, summary_path: &Path) -> Result<()> {
    for path in [records_path, summary_path] {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    let mut writer = csv::Writer::from_path(records_path)?;
    for record in report.records() {
        writer.serialize(record)?;
    }
    writer.flush()?;

    let mut writer = csv::Writer::from_path(summary_path)?;
    for summary in report.summaries() {
        writer.serialize(&summary)?;
    }
    writer.flush()?;

    info!(
        "Wrote match report: {} matched, {} unmatched",
        report.matched_count(),
        report.unmatched_count()
    );
    Ok(())
}
