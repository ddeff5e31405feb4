pub mod event;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use self::event::{extract_total, LogEvent};

/// Metric names the filter recognises in a k6 event stream.
const METRIC_DURATION: &str = "http_req_duration";
const METRIC_FAILED: &str = "http_req_failed";
const METRIC_REQS: &str = "http_reqs";

/// Tag marking a response k6 considered successful.
const TAG_EXPECTED_RESPONSE: &str = "expected_response";

// ---------------------------------------------------------------------------
// SampleSet — raw observations for one concurrency level
// ---------------------------------------------------------------------------

/// Raw observations extracted from one level's event stream.
///
/// Populated by a single pass over the stream, then frozen; all derived
/// statistics are computed from it afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SampleSet {
    /// Accepted request durations (ms), in arrival order.
    pub durations: Vec<f64>,
    /// Number of requests k6 flagged as failed.
    pub failed_requests: u64,
    /// Reported request total; falls back to `durations.len()` when the
    /// stream never reports one.
    pub total_requests: u64,
}

impl SampleSet {
    fn accept(&mut self, event: LogEvent) {
        match event {
            LogEvent::Point {
                metric,
                value,
                tags,
            } if metric == METRIC_DURATION => {
                // Only durations of responses k6 marked as expected count.
                if tags.get(TAG_EXPECTED_RESPONSE).map(String::as_str) == Some("true") {
                    if let Some(ms) = value {
                        self.durations.push(ms);
                    }
                }
            }
            LogEvent::Point { metric, value, .. } if metric == METRIC_FAILED => {
                // http_req_failed emits 1 for a failure, 0 otherwise.
                if value == Some(1.0) {
                    self.failed_requests += 1;
                }
            }
            LogEvent::Summary { metric, text } if metric == METRIC_REQS => {
                if let Some(total) = extract_total(&text) {
                    self.total_requests = total;
                }
            }
            _ => {}
        }
    }

    /// Applied exactly once, after the stream is exhausted.
    fn finalize(&mut self) {
        if self.total_requests == 0 && !self.durations.is_empty() {
            self.total_requests = self.durations.len() as u64;
        }
    }
}

// ---------------------------------------------------------------------------
// Stream scanning
// ---------------------------------------------------------------------------

/// Reduce a line-delimited k6 event stream to a [`SampleSet`].
///
/// Malformed lines are skipped silently; an I/O error while reading aborts
/// the scan and is returned to the caller.
pub fn scan_reader<R: BufRead>(reader: R) -> std::io::Result<SampleSet> {
    let mut samples = SampleSet::default();
    for line in reader.lines() {
        samples.accept(LogEvent::parse(&line?));
    }
    samples.finalize();
    Ok(samples)
}

/// Scan one result file, treating any failure as "no metrics for this level".
///
/// A missing file is expected (not every configured VU level has a run) and
/// logged at info; an open or read error is logged at warn. Both yield
/// `None`, so one bad file never prevents other levels from producing
/// correct output.
pub fn scan_file(path: &Path) -> Option<SampleSet> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "result file not found, level skipped");
            return None;
        }
        Err(err) => {
            warn!(path = %path.display(), %err, "could not open result file, level skipped");
            return None;
        }
    };
    match scan_reader(BufReader::new(file)) {
        Ok(samples) => Some(samples),
        Err(err) => {
            warn!(path = %path.display(), %err, "read failed, level skipped");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
