use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::percentile::nearest_rank;
use crate::jtl::JtlRecord;

/// Label of the synthetic row aggregating every sample of a file.
pub const TOTAL_LABEL: &str = "Total";

// ---------------------------------------------------------------------------
// EndpointStatistics: one label's summary
// ---------------------------------------------------------------------------

/// Summary statistics for one label (endpoint / transaction).
///
/// All latency figures are milliseconds, taken from the group's sorted
/// `elapsed` values with nearest-rank selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStatistics {
    pub count: u64,
    pub failures: u64,
    /// `failures / count * 100`, or 0 for an empty group.
    pub error_percentage: f64,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub median: f64,
    pub percentile90: f64,
    pub percentile95: f64,
    pub percentile99: f64,
    /// Requests per second over the whole file's duration.
    pub throughput: f64,
}

impl EndpointStatistics {
    /// Compute a group's statistics. `elapsed` need not be sorted.
    fn from_samples(mut elapsed: Vec<u64>, failures: u64, duration_secs: f64) -> Self {
        if elapsed.is_empty() {
            return Self::default();
        }
        elapsed.sort_unstable();
        let count = elapsed.len() as u64;
        let sum: u128 = elapsed.iter().map(|&ms| u128::from(ms)).sum();

        Self {
            count,
            failures,
            error_percentage: failures as f64 / count as f64 * 100.0,
            min: elapsed[0] as f64,
            max: elapsed[elapsed.len() - 1] as f64,
            average: sum as f64 / count as f64,
            median: nearest_rank(&elapsed, 50.0) as f64,
            percentile90: nearest_rank(&elapsed, 90.0) as f64,
            percentile95: nearest_rank(&elapsed, 95.0) as f64,
            percentile99: nearest_rank(&elapsed, 99.0) as f64,
            throughput: count as f64 / duration_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// Statistics: whole-file summary
// ---------------------------------------------------------------------------

/// Global and per-label statistics of one result file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_samples: u64,
    pub failures: u64,
    pub error_percentage: f64,
    pub avg_response_time: f64,
    pub min_response_time: f64,
    pub max_response_time: f64,
    pub median_response_time: f64,
    pub percentile90: f64,
    pub percentile95: f64,
    pub percentile99: f64,
    pub throughput: f64,
    #[serde(rename = "receivedKBPerSec")]
    pub received_kb_per_sec: f64,
    #[serde(rename = "sentKBPerSec")]
    pub sent_kb_per_sec: f64,
    /// Seconds between the first and last sample start, never below 1 when
    /// there is at least one sample.
    pub duration_secs: f64,
    pub by_label: BTreeMap<String, EndpointStatistics>,
}

impl Statistics {
    /// The global figures presented as a [`TOTAL_LABEL`] row.
    pub fn total(&self) -> EndpointStatistics {
        EndpointStatistics {
            count: self.total_samples,
            failures: self.failures,
            error_percentage: self.error_percentage,
            min: self.min_response_time,
            max: self.max_response_time,
            average: self.avg_response_time,
            median: self.median_response_time,
            percentile90: self.percentile90,
            percentile95: self.percentile95,
            percentile99: self.percentile99,
            throughput: self.throughput,
        }
    }

    /// Per-label rows followed by the `Total` row.
    pub fn rows(&self) -> Vec<(&str, EndpointStatistics)> {
        let mut rows: Vec<(&str, EndpointStatistics)> = self
            .by_label
            .iter()
            .map(|(label, stats)| (label.as_str(), stats.clone()))
            .collect();
        rows.push((TOTAL_LABEL, self.total()));
        rows
    }
}

/// Span between the earliest and latest sample start in seconds.
///
/// A zero span (one sample, or identical timestamps) is reported as one
/// second so rates stay finite. This overstates throughput for such inputs.
pub fn observed_duration_secs(records: &[JtlRecord]) -> f64 {
    let mut timestamps = records.iter().map(JtlRecord::timestamp);
    let Some(first) = timestamps.next() else {
        return 0.0;
    };
    let (start, end) = timestamps.fold((first, first), |(lo, hi), ts| (lo.min(ts), hi.max(ts)));
    let secs = end.abs_diff(start) as f64 / 1000.0;
    if secs == 0.0 {
        1.0
    } else {
        secs
    }
}

/// Compute global and per-label statistics over a file's records.
///
/// Failed samples count toward every figure. Each label's throughput is
/// divided by the global duration, not by the label's own span.
pub fn aggregate(records: &[JtlRecord]) -> Statistics {
    if records.is_empty() {
        return Statistics::default();
    }

    let duration_secs = observed_duration_secs(records);

    let mut groups: BTreeMap<&str, (Vec<u64>, u64)> = BTreeMap::new();
    let mut all_elapsed = Vec::with_capacity(records.len());
    let mut failures = 0u64;
    // u128 so that no file can overflow the totals.
    let mut bytes_received = 0u128;
    let mut bytes_sent = 0u128;

    for record in records {
        let elapsed = record.elapsed_ms();
        let failed = !record.is_success();
        all_elapsed.push(elapsed);
        if failed {
            failures += 1;
        }
        bytes_received += u128::from(record.bytes_received());
        bytes_sent += u128::from(record.bytes_sent());

        let group = groups.entry(record.label()).or_default();
        group.0.push(elapsed);
        if failed {
            group.1 += 1;
        }
    }

    let overall = EndpointStatistics::from_samples(all_elapsed, failures, duration_secs);
    let by_label: BTreeMap<String, EndpointStatistics> = groups
        .into_iter()
        .map(|(label, (elapsed, failed))| {
            (
                label.to_string(),
                EndpointStatistics::from_samples(elapsed, failed, duration_secs),
            )
        })
        .collect();

    tracing::debug!(
        samples = overall.count,
        labels = by_label.len(),
        duration_secs,
        "aggregated statistics"
    );

    Statistics {
        total_samples: overall.count,
        failures: overall.failures,
        error_percentage: overall.error_percentage,
        avg_response_time: overall.average,
        min_response_time: overall.min,
        max_response_time: overall.max,
        median_response_time: overall.median,
        percentile90: overall.percentile90,
        percentile95: overall.percentile95,
        percentile99: overall.percentile99,
        throughput: overall.throughput,
        received_kb_per_sec: bytes_received as f64 / 1024.0 / duration_secs,
        sent_kb_per_sec: bytes_sent as f64 / 1024.0 / duration_secs,
        duration_secs,
        by_label,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
