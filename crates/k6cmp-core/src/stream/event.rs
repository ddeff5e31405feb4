use std::collections::HashMap;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// LogEvent — one parsed line of a k6 JSON event stream
// ---------------------------------------------------------------------------

/// One line of a k6 `--out json` stream, reduced to the shapes the stream
/// filter inspects.
///
/// Anything that fails to parse, or parses to an event kind the filter never
/// looks at, lands in [`LogEvent::Unrecognized`]. That makes skip-on-malformed
/// an explicit case in the caller's match rather than an implicit fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEvent {
    /// A timed data point (`"type": "Point"`).
    Point {
        metric: String,
        /// The sample value; `None` when absent or non-numeric.
        value: Option<f64>,
        tags: HashMap<String, String>,
    },
    /// A rendered textual summary block (`"type": "TextSummary"`).
    Summary { metric: String, text: String },
    /// Malformed line, or an event kind the filter does not inspect.
    Unrecognized,
}

/// Wire shape of a k6 event line. Points nest `value`/`tags` under `data`;
/// TextSummary blocks nest their rendered text under `data.data`.
#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    metric: Option<String>,
    #[serde(default)]
    data: RawData,
}

#[derive(Debug, Default, Deserialize)]
struct RawData {
    value: Option<serde_json::Value>,
    tags: Option<HashMap<String, String>>,
    data: Option<String>,
}

impl LogEvent {
    /// Parse a single stream line. Never fails: anything that is not valid
    /// JSON with a recognised event kind becomes [`LogEvent::Unrecognized`].
    pub fn parse(line: &str) -> LogEvent {
        let raw: RawEvent = match serde_json::from_str(line) {
            Ok(raw) => raw,
            Err(_) => return LogEvent::Unrecognized,
        };
        let metric = match raw.metric {
            Some(metric) => metric,
            None => return LogEvent::Unrecognized,
        };
        match raw.kind.as_str() {
            "Point" => LogEvent::Point {
                metric,
                value: raw.data.value.as_ref().and_then(serde_json::Value::as_f64),
                tags: raw.data.tags.unwrap_or_default(),
            },
            "TextSummary" => LogEvent::Summary {
                metric,
                text: raw.data.data.unwrap_or_default(),
            },
            _ => LogEvent::Unrecognized,
        }
    }
}

// ---------------------------------------------------------------------------
// Summary-text total extraction
// ---------------------------------------------------------------------------

/// Best-effort scan of a summary block for a labelled request total.
///
/// Returns the first all-digit token on the first line carrying a
/// `total`/`Total` label. k6 summary text is free-form, so `None` means
/// "no value found", never an error; callers fall back to counting samples.
pub fn extract_total(text: &str) -> Option<u64> {
    for line in text.lines() {
        if !line.contains("total") && !line.contains("Total") {
            continue;
        }
        for token in line.split_whitespace() {
            if token.bytes().all(|b| b.is_ascii_digit()) && !token.is_empty() {
                return token.parse().ok();
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
