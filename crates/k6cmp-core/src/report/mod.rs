pub mod charts;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};

use crate::error::K6cmpError;
use crate::stats::SummaryRecord;

const RULE_WIDTH: usize = 100;

// ---------------------------------------------------------------------------
// Comparative table
// ---------------------------------------------------------------------------

/// Render the comparative metrics table for a set of per-level summaries.
///
/// Fixed-width columns: VUs, Avg Duration (ms), P(95) (ms), Failed Requests,
/// Total Requests. Records are rendered in the order given (the aggregator
/// already sorts them by VU count). An empty slice renders the frame with no
/// data rows, so a run with no input files still produces a readable report.
pub fn render_table(records: &[SummaryRecord]) -> String {
    let mut out = String::new();

    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push('\n');
    out.push_str("K6 COMPARATIVE METRICS\n");
    out.push_str(&format!(
        "Generated: {}\n",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push_str("\n\n");

    out.push_str(&format!(
        "{:<8} | {:<20} | {:<15} | {:<18} | {:<15}\n",
        "VUs", "Avg Duration (ms)", "P(95) (ms)", "Failed Requests", "Total Requests"
    ));
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');

    for record in records {
        out.push_str(&format!(
            "{:<8} | {:<20.2} | {:<15.2} | {:<18} | {:<15}\n",
            record.vus,
            record.mean_ms,
            record.p95_ms,
            record.failed_requests,
            record.total_requests
        ));
    }

    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');
    out
}

// ---------------------------------------------------------------------------
// Atomic persistence
// ---------------------------------------------------------------------------

/// Write `contents` to `path` in whole: stage into a sibling temp file, then
/// rename over the destination. A consumer never observes a partially
/// written report.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), K6cmpError> {
    if path.file_name().is_none() {
        return Err(K6cmpError::Output(format!(
            "not a writable file path: {}",
            path.display()
        )));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut staged = path.as_os_str().to_owned();
    staged.push(".tmp");
    let staged = PathBuf::from(staged);

    fs::write(&staged, contents)?;
    fs::rename(&staged, path)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
