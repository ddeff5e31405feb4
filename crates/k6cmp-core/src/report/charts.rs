//! Standalone HTML chart document for a comparative run.
//!
//! Everything is inline (CSS + SVG), no external assets — the returned
//! string can be saved as a `.html` file and opened directly in a browser.

use chrono::{SecondsFormat, Utc};

use crate::stats::{mean, percentile, LevelResults, SummaryRecord};

/// Histogram rendering uses only the first of this many samples per level.
const HISTOGRAM_SAMPLE_CAP: usize = 1000;
const HISTOGRAM_BINS: usize = 50;

// Plot geometry (px). The margins leave room for axis labels.
const SVG_W: f64 = 520.0;
const SVG_H: f64 = 300.0;
const M_LEFT: f64 = 62.0;
const M_RIGHT: f64 = 18.0;
const M_TOP: f64 = 16.0;
const M_BOTTOM: f64 = 38.0;

const COLOR_MEAN: &str = "#2E86AB";
const COLOR_P95: &str = "#A23B72";
const COLOR_TOTAL: &str = "#F18F01";
const COLOR_OK: &str = "#06A77D";
const COLOR_FAIL: &str = "#D62828";

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Render the full chart document: mean/p95 line charts and failed/total bar
/// charts across VU levels, followed by one latency histogram per level.
///
/// `records` must already be sorted by ascending VU count (as produced by
/// [`LevelResults::summaries`]).
pub fn render_charts(records: &[SummaryRecord], results: &LevelResults) -> String {
    let mean_points: Vec<(u32, f64)> = records.iter().map(|r| (r.vus, r.mean_ms)).collect();
    let p95_points: Vec<(u32, f64)> = records.iter().map(|r| (r.vus, r.p95_ms)).collect();
    let failed_bars: Vec<(u32, u64)> =
        records.iter().map(|r| (r.vus, r.failed_requests)).collect();
    let total_bars: Vec<(u32, u64)> =
        records.iter().map(|r| (r.vus, r.total_requests)).collect();

    let summary_figures = [
        line_chart("Avg Duration vs VUs", "ms", &mean_points, COLOR_MEAN),
        line_chart("P(95) vs VUs", "ms", &p95_points, COLOR_P95),
        bar_chart("Failed Requests vs VUs", &failed_bars, |count| {
            if count == 0 {
                COLOR_OK
            } else {
                COLOR_FAIL
            }
        }),
        bar_chart("Total Requests vs VUs", &total_bars, |_| COLOR_TOTAL),
    ]
    .join("\n");

    let histogram_figures = records
        .iter()
        .map(|r| histogram(r.vus, results.durations(r.vus).unwrap_or(&[])))
        .collect::<Vec<_>>()
        .join("\n");

    let generated = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>k6 Comparative Metrics</title>
<style>
  *, *::before, *::after {{ box-sizing: border-box; }}
  body {{
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    margin: 0; padding: 2rem;
    background: #0f172a; color: #e2e8f0;
    line-height: 1.5;
  }}
  h1 {{ font-size: 1.75rem; font-weight: 700; color: #f1f5f9; margin: 0 0 0.25rem; }}
  h2 {{ font-size: 1.125rem; font-weight: 600; color: #94a3b8;
        text-transform: uppercase; letter-spacing: 0.05em;
        margin: 2rem 0 0.75rem; border-bottom: 1px solid #1e293b; padding-bottom: 0.5rem; }}
  .meta {{ color: #64748b; font-size: 0.875rem; margin-bottom: 2rem; }}
  .chart-grid {{
    display: grid;
    grid-template-columns: repeat(auto-fill, minmax(540px, 1fr));
    gap: 1.5rem;
  }}
  figure {{
    margin: 0; background: #1e293b; border: 1px solid #334155;
    border-radius: 0.5rem; padding: 1rem;
  }}
  figcaption {{
    font-size: 0.875rem; font-weight: 600; color: #cbd5e1;
    margin-bottom: 0.5rem;
  }}
  svg text {{ font-family: inherit; }}
  footer {{
    margin-top: 3rem; padding-top: 1rem; border-top: 1px solid #1e293b;
    color: #475569; font-size: 0.8125rem;
  }}
</style>
</head>
<body>
<h1>k6 Comparative Metrics</h1>
<div class="meta">Generated: {generated} &middot; {level_count} level(s)</div>

<h2>Summary</h2>
<div class="chart-grid">
{summary_figures}
</div>

<h2>Latency Distribution</h2>
<div class="chart-grid">
{histogram_figures}
</div>

<footer>Generated by k6cmp &bull; {generated}</footer>
</body>
</html>
"#,
        generated = generated,
        level_count = records.len(),
        summary_figures = summary_figures,
        histogram_figures = histogram_figures,
    )
}

// ---------------------------------------------------------------------------
// Figures
// ---------------------------------------------------------------------------

fn figure(caption: &str, svg_body: &str) -> String {
    format!(
        "<figure>\n<figcaption>{}</figcaption>\n<svg viewBox=\"0 0 {SVG_W} {SVG_H}\" \
         width=\"{SVG_W}\" height=\"{SVG_H}\" xmlns=\"http://www.w3.org/2000/svg\">\n{}\n</svg>\n</figure>",
        html_escape(caption),
        svg_body
    )
}

fn empty_figure(caption: &str) -> String {
    figure(
        caption,
        &format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" fill=\"#64748b\" font-size=\"13\" \
             text-anchor=\"middle\">no samples</text>",
            SVG_W / 2.0,
            SVG_H / 2.0
        ),
    )
}

/// Horizontal grid lines with y-axis labels, plus the two axis strokes.
fn axes_and_grid(y_max: f64, y_unit: &str) -> String {
    let mut out = String::new();
    for step in 0..=4 {
        let frac = step as f64 / 4.0;
        let y = SVG_H - M_BOTTOM - frac * (SVG_H - M_TOP - M_BOTTOM);
        out.push_str(&format!(
            "<line x1=\"{M_LEFT}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" \
             stroke=\"#334155\" stroke-width=\"1\"/>\n",
            SVG_W - M_RIGHT
        ));
        out.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" fill=\"#94a3b8\" font-size=\"11\" \
             text-anchor=\"end\">{}</text>\n",
            M_LEFT - 6.0,
            y + 4.0,
            format_tick(frac * y_max, y_unit)
        ));
    }
    out.push_str(&format!(
        "<line x1=\"{M_LEFT}\" y1=\"{M_TOP}\" x2=\"{M_LEFT}\" y2=\"{:.1}\" \
         stroke=\"#64748b\" stroke-width=\"1\"/>\n",
        SVG_H - M_BOTTOM
    ));
    out.push_str(&format!(
        "<line x1=\"{M_LEFT}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" \
         stroke=\"#64748b\" stroke-width=\"1\"/>\n",
        SVG_H - M_BOTTOM,
        SVG_W - M_RIGHT,
        SVG_H - M_BOTTOM
    ));
    out
}

fn format_tick(value: f64, unit: &str) -> String {
    if value >= 100.0 || value.fract() == 0.0 {
        format!("{value:.0}{unit}")
    } else {
        format!("{value:.1}{unit}")
    }
}

fn x_tick_label(x: f64, label: &str) -> String {
    format!(
        "<text x=\"{x:.1}\" y=\"{:.1}\" fill=\"#94a3b8\" font-size=\"11\" \
         text-anchor=\"middle\">{}</text>\n",
        SVG_H - M_BOTTOM + 16.0,
        html_escape(label)
    )
}

/// Scale a value in `[0, max]` to a y pixel coordinate (top of plot = max).
fn y_px(value: f64, y_max: f64) -> f64 {
    let frac = if y_max > 0.0 { value / y_max } else { 0.0 };
    SVG_H - M_BOTTOM - frac * (SVG_H - M_TOP - M_BOTTOM)
}

fn line_chart(title: &str, unit: &str, points: &[(u32, f64)], color: &str) -> String {
    if points.is_empty() {
        return empty_figure(title);
    }

    let x_min = f64::from(points[0].0);
    let x_max = f64::from(points[points.len() - 1].0);
    let x_px = |vus: u32| -> f64 {
        if x_max > x_min {
            M_LEFT + (f64::from(vus) - x_min) / (x_max - x_min) * (SVG_W - M_LEFT - M_RIGHT)
        } else {
            (M_LEFT + SVG_W - M_RIGHT) / 2.0
        }
    };
    let y_max = headroom(points.iter().map(|&(_, v)| v).fold(0.0, f64::max));

    let mut body = axes_and_grid(y_max, unit);

    let polyline: Vec<String> = points
        .iter()
        .map(|&(vus, v)| format!("{:.1},{:.1}", x_px(vus), y_px(v, y_max)))
        .collect();
    body.push_str(&format!(
        "<polyline points=\"{}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"2\"/>\n",
        polyline.join(" ")
    ));

    for &(vus, v) in points {
        let x = x_px(vus);
        let y = y_px(v, y_max);
        body.push_str(&format!(
            "<circle cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"4\" fill=\"{color}\"/>\n"
        ));
        body.push_str(&format!(
            "<text x=\"{x:.1}\" y=\"{:.1}\" fill=\"#e2e8f0\" font-size=\"11\" \
             text-anchor=\"middle\">{v:.0}{unit}</text>\n",
            y - 8.0
        ));
        body.push_str(&x_tick_label(x, &vus.to_string()));
    }

    figure(title, &body)
}

fn bar_chart(title: &str, bars: &[(u32, u64)], color_for: impl Fn(u64) -> &'static str) -> String {
    if bars.is_empty() {
        return empty_figure(title);
    }

    let y_max = headroom(bars.iter().map(|&(_, v)| v as f64).fold(0.0, f64::max));
    let slot = (SVG_W - M_LEFT - M_RIGHT) / bars.len() as f64;
    let bar_w = (slot * 0.6).min(80.0);

    let mut body = axes_and_grid(y_max, "");

    for (i, &(vus, count)) in bars.iter().enumerate() {
        let center = M_LEFT + (i as f64 + 0.5) * slot;
        let top = y_px(count as f64, y_max);
        let base = SVG_H - M_BOTTOM;
        body.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{top:.1}\" width=\"{bar_w:.1}\" height=\"{:.1}\" \
             fill=\"{}\" fill-opacity=\"0.75\" stroke=\"#0f172a\"/>\n",
            center - bar_w / 2.0,
            base - top,
            color_for(count)
        ));
        body.push_str(&format!(
            "<text x=\"{center:.1}\" y=\"{:.1}\" fill=\"#e2e8f0\" font-size=\"11\" \
             text-anchor=\"middle\">{count}</text>\n",
            top - 5.0
        ));
        body.push_str(&x_tick_label(center, &vus.to_string()));
    }

    figure(title, &body)
}

fn histogram(vus: u32, durations: &[f64]) -> String {
    let title = format!("Latency Distribution, {vus} VUs");
    let capped = &durations[..durations.len().min(HISTOGRAM_SAMPLE_CAP)];
    if capped.is_empty() {
        return empty_figure(&title);
    }

    let lo = capped.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = capped.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if hi > lo { hi - lo } else { 1.0 };

    let mut bins = [0u64; HISTOGRAM_BINS];
    for &ms in capped {
        let idx = (((ms - lo) / span) * HISTOGRAM_BINS as f64) as usize;
        bins[idx.min(HISTOGRAM_BINS - 1)] += 1;
    }

    let y_max = headroom(bins.iter().map(|&c| c as f64).fold(0.0, f64::max));
    let bin_w = (SVG_W - M_LEFT - M_RIGHT) / HISTOGRAM_BINS as f64;
    let base = SVG_H - M_BOTTOM;

    let mut body = axes_and_grid(y_max, "");

    for (i, &count) in bins.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let top = y_px(count as f64, y_max);
        body.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{top:.1}\" width=\"{:.1}\" height=\"{:.1}\" \
             fill=\"{COLOR_MEAN}\" fill-opacity=\"0.75\"/>\n",
            M_LEFT + i as f64 * bin_w,
            bin_w.max(1.0) - 0.5,
            base - top
        ));
    }

    // Mean and p95 markers, computed over the same capped window the bins use.
    let mean_ms = mean(capped);
    let p95_ms = percentile(capped, 95.0);
    for (value, color, label) in [
        (mean_ms, COLOR_FAIL, "mean"),
        (p95_ms, COLOR_TOTAL, "p95"),
    ] {
        let x = M_LEFT + ((value - lo) / span).clamp(0.0, 1.0) * (SVG_W - M_LEFT - M_RIGHT);
        body.push_str(&format!(
            "<line x1=\"{x:.1}\" y1=\"{M_TOP}\" x2=\"{x:.1}\" y2=\"{base:.1}\" \
             stroke=\"{color}\" stroke-width=\"2\" stroke-dasharray=\"6 3\"/>\n"
        ));
        body.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" fill=\"{color}\" font-size=\"11\">{label}: \
             {value:.0}ms</text>\n",
            x + 4.0,
            M_TOP + 12.0
        ));
    }

    // Range labels on the x axis.
    body.push_str(&x_tick_label(M_LEFT, &format!("{lo:.0}ms")));
    body.push_str(&x_tick_label(SVG_W - M_RIGHT, &format!("{hi:.0}ms")));

    figure(&title, &body)
}

/// Top-of-axis value: 5% above the data maximum, with a floor of 1 so an
/// all-zero series still has a drawable axis.
fn headroom(data_max: f64) -> f64 {
    (data_max * 1.05).max(1.0)
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
