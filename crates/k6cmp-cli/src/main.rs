use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use k6cmp_core::report::charts::render_charts;
use k6cmp_core::report::{render_table, write_atomic};
use k6cmp_core::stats::LevelResults;
use k6cmp_core::stream::scan_file;

/// Comparative metrics reports for k6 load-test result streams.
///
/// Reads one `test-<vus>-vus.json` event stream per configured VU level,
/// aggregates per-level latency/failure statistics and writes a fixed-width
/// report table plus an HTML chart document. Missing or unreadable levels
/// are skipped; they never abort the run.
#[derive(Debug, Parser)]
#[command(name = "k6cmp", version, about)]
struct Cli {
    /// Directory containing the k6 result files.
    #[arg(long, default_value = "results")]
    results_dir: PathBuf,

    /// VU levels to compare.
    #[arg(long = "vus", value_delimiter = ',', default_values_t = [100u32, 150, 200, 300])]
    vus: Vec<u32>,

    /// Destination for the report table.
    #[arg(long, default_value = "results/comparative-metrics.txt")]
    report: PathBuf,

    /// Destination for the chart document.
    #[arg(long, default_value = "results/comparative-metrics.html")]
    charts: PathBuf,

    /// Optional destination for the summary records as JSON.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Debug-level logging.
    #[arg(short, long)]
    verbose: bool,
}

/// Result-file naming convention: `test-<vus>-vus.json`.
fn result_file(dir: &Path, vus: u32) -> PathBuf {
    dir.join(format!("test-{vus}-vus.json"))
}

/// Scan every configured level; absent or unreadable levels are omitted.
fn collect_levels(dir: &Path, vus: &[u32]) -> LevelResults {
    let mut results = LevelResults::new();
    for &level in vus {
        let path = result_file(dir, level);
        if let Some(samples) = scan_file(&path) {
            info!(
                vus = level,
                samples = samples.durations.len(),
                failed = samples.failed_requests,
                "level processed"
            );
            results.insert(level, samples);
        }
    }
    results
}

fn run(cli: &Cli) -> ExitCode {
    let results = collect_levels(&cli.results_dir, &cli.vus);
    if results.is_empty() {
        info!("no result files found, report will be empty");
    }
    let records = results.summaries();

    // The table always goes to stdout, even if persisting it fails later.
    let table = render_table(&records);
    print!("{table}");

    let mut write_failures = 0u32;

    if let Err(err) = write_atomic(&cli.report, &table) {
        error!(path = %cli.report.display(), %err, "could not write report");
        write_failures += 1;
    }

    if results.is_empty() {
        info!("chart output skipped, no levels to draw");
    } else {
        let charts = render_charts(&records, &results);
        if let Err(err) = write_atomic(&cli.charts, &charts) {
            error!(path = %cli.charts.display(), %err, "could not write charts");
            write_failures += 1;
        }
    }

    if let Some(json_path) = &cli.json {
        match serde_json::to_string_pretty(&records) {
            Ok(json) => {
                if let Err(err) = write_atomic(json_path, &json) {
                    error!(path = %json_path.display(), %err, "could not write JSON summary");
                    write_failures += 1;
                }
            }
            Err(err) => {
                error!(%err, "could not serialize summary records");
                write_failures += 1;
            }
        }
    }

    if write_failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    run(&cli)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
