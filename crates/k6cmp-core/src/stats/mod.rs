use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stream::SampleSet;

// ---------------------------------------------------------------------------
// Scalar statistics
// ---------------------------------------------------------------------------

/// Arithmetic mean. Returns `0.0` for an empty slice: an empty level has no
/// central tendency but still has to render in the comparative table.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Nearest-rank percentile: `sorted[min(floor(p/100 * n), n - 1)]`.
///
/// The result is always a value actually present in `values`, never an
/// interpolation between two samples. This is the rank convention of the
/// k6 post-processing pipeline this tool replaces; swapping in a library
/// percentile would change the reported numbers. Returns `0.0` for an
/// empty slice.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let idx = ((p / 100.0) * sorted.len() as f64) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

// ---------------------------------------------------------------------------
// SummaryRecord — derived per-level statistics
// ---------------------------------------------------------------------------

/// Derived statistics for one concurrency level.
///
/// A pure function of the level's frozen [`SampleSet`]; recomputing it from
/// the same set always yields the same record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SummaryRecord {
    /// Virtual-user count for this level.
    pub vus: u32,
    /// Mean request duration (ms).
    pub mean_ms: f64,
    /// 95th-percentile request duration (ms), nearest-rank.
    pub p95_ms: f64,
    pub failed_requests: u64,
    pub total_requests: u64,
}

impl SummaryRecord {
    pub fn from_samples(vus: u32, samples: &SampleSet) -> Self {
        Self {
            vus,
            mean_ms: mean(&samples.durations),
            p95_ms: percentile(&samples.durations, 95.0),
            failed_requests: samples.failed_requests,
            total_requests: samples.total_requests,
        }
    }
}

// ---------------------------------------------------------------------------
// LevelResults — per-level sample sets for one comparative run
// ---------------------------------------------------------------------------

/// All sample sets of one comparative run, keyed by VU count.
///
/// An explicit value rather than module state, so the engine can be driven
/// repeatedly with different level sets without interference. The BTreeMap
/// keeps levels in ascending numeric order regardless of insertion order,
/// which is the ordering every presentation layer assumes.
#[derive(Debug, Clone, Default)]
pub struct LevelResults {
    levels: BTreeMap<u32, SampleSet>,
}

impl LevelResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one level's frozen sample set. Inserting the same level twice
    /// replaces the earlier set.
    pub fn insert(&mut self, vus: u32, samples: SampleSet) {
        self.levels.insert(vus, samples);
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Present VU levels, ascending.
    pub fn levels(&self) -> impl Iterator<Item = u32> + '_ {
        self.levels.keys().copied()
    }

    /// Raw duration distribution for one level, for consumers that need the
    /// full distribution (e.g. histogram rendering) rather than the summary.
    pub fn durations(&self, vus: u32) -> Option<&[f64]> {
        self.levels.get(&vus).map(|s| s.durations.as_slice())
    }

    /// Summary records for all present levels, sorted by ascending VU count.
    pub fn summaries(&self) -> Vec<SummaryRecord> {
        self.levels
            .iter()
            .map(|(&vus, samples)| SummaryRecord::from_samples(vus, samples))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn set(durations: &[f64], failed: u64, total: u64) -> SampleSet {
        SampleSet {
            durations: durations.to_vec(),
            failed_requests: failed,
            total_requests: total,
        }
    }

    // -----------------------------------------------------------------------
    // mean
    // -----------------------------------------------------------------------

    #[test]
    fn mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn mean_single_value_is_that_value() {
        assert_eq!(mean(&[42.5]), 42.5);
    }

    #[test]
    fn mean_of_ramp() {
        // Scenario: durations 10..=50 step 10.
        assert!((mean(&[10.0, 20.0, 30.0, 40.0, 50.0]) - 30.0).abs() < f64::EPSILON);
    }

    // -----------------------------------------------------------------------
    // percentile
    // -----------------------------------------------------------------------

    #[test]
    fn percentile_empty_is_zero() {
        assert_eq!(percentile(&[], 95.0), 0.0);
    }

    #[test]
    fn percentile_single_value_is_that_value() {
        assert_eq!(percentile(&[7.25], 95.0), 7.25);
    }

    #[test]
    fn p95_of_five_samples_is_the_maximum() {
        // floor(0.95 * 5) = 4, already the last index.
        assert_eq!(percentile(&[10.0, 20.0, 30.0, 40.0, 50.0], 95.0), 50.0);
    }

    #[test]
    fn p95_of_nineteen_identical_samples() {
        // floor(0.95 * 19) = 18, clamped to 18.
        let values = vec![100.0; 19];
        assert_eq!(percentile(&values, 95.0), 100.0);
    }

    #[test]
    fn p95_of_twenty_samples_uses_floor_rank() {
        // 1..=20; floor(0.95 * 20) = 19 -> sorted[19] = 20.
        let values: Vec<f64> = (1..=20).map(f64::from).collect();
        assert_eq!(percentile(&values, 95.0), 20.0);
    }

    #[test]
    fn p95_of_hundred_samples() {
        // 1..=100; floor(0.95 * 100) = 95 -> sorted[95] = 96.
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        assert_eq!(percentile(&values, 95.0), 96.0);
    }

    #[test]
    fn percentile_result_is_always_a_sample() {
        let values = [3.0, 1.0, 4.0, 1.5, 9.0, 2.6, 5.3];
        for p in [5.0, 25.0, 50.0, 75.0, 95.0, 99.0] {
            let result = percentile(&values, p);
            assert!(
                values.contains(&result),
                "p{p} = {result} is not one of the samples"
            );
        }
    }

    #[test]
    fn percentile_ignores_insertion_order() {
        let ascending = [1.0, 2.0, 3.0, 4.0, 5.0];
        let shuffled = [4.0, 1.0, 5.0, 3.0, 2.0];
        assert_eq!(percentile(&ascending, 95.0), percentile(&shuffled, 95.0));
    }

    #[test]
    fn p95_never_decreases_when_appending_values_at_or_above_max() {
        let mut values = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        let mut last = percentile(&values, 95.0);
        for extra in [50.0, 60.0, 75.0, 75.0, 120.0] {
            values.push(extra);
            let p95 = percentile(&values, 95.0);
            assert!(p95 >= last, "p95 dropped from {last} to {p95}");
            last = p95;
        }
    }

    #[test]
    fn percentile_matches_rank_formula_for_all_small_n() {
        for n in 1..=50usize {
            let values: Vec<f64> = (0..n).map(|i| i as f64).collect();
            let idx = ((0.95 * n as f64) as usize).min(n - 1);
            assert_eq!(percentile(&values, 95.0), values[idx], "n = {n}");
        }
    }

    // -----------------------------------------------------------------------
    // SummaryRecord
    // -----------------------------------------------------------------------

    #[test]
    fn from_samples_carries_counts_through_unchanged() {
        let samples = set(&[10.0, 20.0], 3, 25);
        let record = SummaryRecord::from_samples(150, &samples);
        assert_eq!(record.vus, 150);
        assert_eq!(record.failed_requests, 3);
        assert_eq!(record.total_requests, 25);
        assert!((record.mean_ms - 15.0).abs() < f64::EPSILON);
        assert_eq!(record.p95_ms, 20.0);
    }

    #[test]
    fn from_samples_empty_set_floors_to_zero() {
        let record = SummaryRecord::from_samples(100, &set(&[], 0, 0));
        assert_eq!(record.mean_ms, 0.0);
        assert_eq!(record.p95_ms, 0.0);
    }

    #[test]
    fn from_samples_is_deterministic() {
        let samples = set(&[5.0, 9.0, 1.0], 1, 3);
        let a = SummaryRecord::from_samples(200, &samples);
        let b = SummaryRecord::from_samples(200, &samples);
        assert_eq!(a, b);
    }

    #[test]
    fn summary_record_serializes_to_snake_case_json() {
        let record = SummaryRecord::from_samples(100, &set(&[10.0], 0, 1));
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["vus"], 100);
        assert_eq!(json["p95_ms"], 10.0);
        assert_eq!(json["total_requests"], 1);
    }

    // -----------------------------------------------------------------------
    // LevelResults
    // -----------------------------------------------------------------------

    #[test]
    fn summaries_are_sorted_by_ascending_vus() {
        let mut results = LevelResults::new();
        results.insert(300, set(&[30.0], 0, 1));
        results.insert(100, set(&[10.0], 0, 1));
        results.insert(200, set(&[20.0], 0, 1));

        let vus: Vec<u32> = results.summaries().iter().map(|r| r.vus).collect();
        assert_eq!(vus, vec![100, 200, 300]);
    }

    #[test]
    fn absent_level_is_omitted_from_summaries() {
        // Two configured levels, only one produced samples.
        let mut results = LevelResults::new();
        results.insert(100, set(&[1.0, 2.0, 3.0, 4.0, 5.0], 0, 5));

        let summaries = results.summaries();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].vus, 100);
        assert!(results.durations(150).is_none());
    }

    #[test]
    fn durations_exposes_raw_distribution() {
        let mut results = LevelResults::new();
        results.insert(100, set(&[3.0, 1.0, 2.0], 0, 3));
        assert_eq!(results.durations(100), Some([3.0, 1.0, 2.0].as_slice()));
    }

    #[test]
    fn empty_results_render_to_empty_summaries() {
        let results = LevelResults::new();
        assert!(results.is_empty());
        assert_eq!(results.len(), 0);
        assert!(results.summaries().is_empty());
    }
}
