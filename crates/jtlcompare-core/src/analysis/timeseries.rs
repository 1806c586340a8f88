use std::collections::BTreeMap;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::analysis::statistics::Statistics;
use crate::jtl::JtlRecord;

/// Width of one time-series window.
pub const BUCKET_WIDTH_MS: i64 = 5000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One fixed-width window of samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesBucket {
    /// `floor(timestamp / width) * width`, epoch milliseconds.
    pub start_ms: i64,
    /// Window start as `HH:MM:SS` (UTC).
    pub time_label: String,
    pub count: u64,
    pub errors: u64,
    pub avg_response_time: f64,
    /// Samples per second of window width.
    pub throughput: f64,
    pub error_rate: f64,
}

/// The global figures repeated next to the series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSummary {
    pub total_requests: u64,
    pub avg_response_time: f64,
    pub error_rate: f64,
    pub throughput: f64,
}

/// A named series of values, one per bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    pub summary: SeriesSummary,
    /// Ascending by `start_ms`.
    pub buckets: Vec<TimeSeriesBucket>,
}

impl TimeSeries {
    pub fn time_labels(&self) -> Vec<&str> {
        self.buckets.iter().map(|b| b.time_label.as_str()).collect()
    }

    /// Response time, throughput and error rate as chart-ready datasets.
    pub fn datasets(&self) -> Vec<Dataset> {
        let series = |label: &str, value: fn(&TimeSeriesBucket) -> f64| Dataset {
            label: label.to_string(),
            values: self.buckets.iter().map(value).collect(),
        };
        vec![
            series("Response Time (ms)", |b| b.avg_response_time),
            series("Throughput (req/sec)", |b| b.throughput),
            series("Error Rate (%)", |b| b.error_rate),
        ]
    }
}

// ---------------------------------------------------------------------------
// Bucketing
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Window {
    count: u64,
    errors: u64,
    sum_ms: u128,
}

/// Group samples into [`BUCKET_WIDTH_MS`] windows by start time.
///
/// Input order does not matter; windows without samples are not emitted.
pub fn bucket_time_series(records: &[JtlRecord], statistics: &Statistics) -> TimeSeries {
    let mut windows: BTreeMap<i64, Window> = BTreeMap::new();
    for record in records {
        let key = record
            .timestamp()
            .div_euclid(BUCKET_WIDTH_MS)
            .saturating_mul(BUCKET_WIDTH_MS);
        let window = windows.entry(key).or_default();
        window.count += 1;
        window.sum_ms += u128::from(record.elapsed_ms());
        if !record.is_success() {
            window.errors += 1;
        }
    }

    let width_secs = BUCKET_WIDTH_MS as f64 / 1000.0;
    let buckets: Vec<TimeSeriesBucket> = windows
        .into_iter()
        .map(|(start_ms, w)| TimeSeriesBucket {
            start_ms,
            time_label: clock_label(start_ms),
            count: w.count,
            errors: w.errors,
            avg_response_time: w.sum_ms as f64 / w.count as f64,
            throughput: w.count as f64 / width_secs,
            error_rate: w.errors as f64 / w.count as f64 * 100.0,
        })
        .collect();

    tracing::debug!(buckets = buckets.len(), "bucketed time series");

    TimeSeries {
        summary: SeriesSummary {
            total_requests: statistics.total_samples,
            avg_response_time: statistics.avg_response_time,
            error_rate: statistics.error_percentage,
            throughput: statistics.throughput,
        },
        buckets,
    }
}

fn clock_label(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::statistics::aggregate;

    fn sample(ts: i64, elapsed: u64, success: bool) -> JtlRecord {
        JtlRecord {
            timestamp: Some(ts),
            elapsed_ms: Some(elapsed),
            label: Some("a".to_string()),
            success: Some(success),
            ..Default::default()
        }
    }

    #[test]
    fn twelve_seconds_make_three_ordered_buckets() {
        let records = vec![
            sample(12_000, 10, true),
            sample(6_000, 10, true),
            sample(0, 10, true),
            sample(9_999, 10, true),
            sample(4_999, 10, true),
            sample(10_000, 10, true),
        ];
        let series = bucket_time_series(&records, &aggregate(&records));
        let starts: Vec<_> = series.buckets.iter().map(|b| b.start_ms).collect();
        assert_eq!(starts, vec![0, 5_000, 10_000]);
        let counts: Vec<_> = series.buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 2, 2]);
    }

    #[test]
    fn ordering_is_numeric_not_lexical() {
        // "100000" sorts before "95000" as text.
        let records = vec![sample(100_000, 10, true), sample(95_000, 10, true)];
        let series = bucket_time_series(&records, &aggregate(&records));
        assert_eq!(series.buckets[0].start_ms, 95_000);
        assert_eq!(series.buckets[1].start_ms, 100_000);
    }

    #[test]
    fn bucket_figures() {
        let records = vec![
            sample(1_000, 100, true),
            sample(2_000, 300, false),
            sample(3_000, 200, true),
            sample(4_000, 400, false),
        ];
        let series = bucket_time_series(&records, &aggregate(&records));
        assert_eq!(series.buckets.len(), 1);
        let b = &series.buckets[0];
        assert_eq!(b.count, 4);
        assert_eq!(b.errors, 2);
        assert_eq!(b.avg_response_time, 250.0);
        assert_eq!(b.throughput, 0.8);
        assert_eq!(b.error_rate, 50.0);
    }

    #[test]
    fn summary_repeats_global_statistics() {
        let records = vec![sample(0, 100, true), sample(2_000, 300, false)];
        let stats = aggregate(&records);
        let series = bucket_time_series(&records, &stats);
        assert_eq!(series.summary.total_requests, 2);
        assert_eq!(series.summary.avg_response_time, 200.0);
        assert_eq!(series.summary.error_rate, 50.0);
        assert_eq!(series.summary.throughput, stats.throughput);
    }

    #[test]
    fn empty_input_has_no_buckets() {
        let series = bucket_time_series(&[], &aggregate(&[]));
        assert!(series.buckets.is_empty());
        assert_eq!(series.summary, SeriesSummary::default());
    }

    #[test]
    fn extreme_values_do_not_overflow_buckets() {
        let records = vec![
            sample(i64::MIN, 10, true),
            sample(i64::MAX, u64::MAX, true),
            sample(i64::MAX, 5, false),
        ];
        let series = bucket_time_series(&records, &aggregate(&records));
        assert_eq!(series.buckets.len(), 2);
        assert_eq!(series.buckets[0].start_ms, i64::MIN);
        let last = &series.buckets[1];
        assert_eq!(last.start_ms, i64::MAX - i64::MAX % BUCKET_WIDTH_MS);
        assert_eq!(last.count, 2);
        assert_eq!(last.avg_response_time, u64::MAX as f64 / 2.0);
        assert_eq!(last.error_rate, 50.0);
    }

    #[test]
    fn time_labels_are_utc_clock_times() {
        // 2024-01-15T10:30:02Z falls in the 10:30:00 window.
        let records = vec![sample(1_705_314_602_000, 10, true)];
        let series = bucket_time_series(&records, &aggregate(&records));
        assert_eq!(series.time_labels(), vec!["10:30:00"]);
    }

    #[test]
    fn datasets_follow_bucket_order() {
        let records = vec![sample(6_000, 40, false), sample(0, 20, true)];
        let series = bucket_time_series(&records, &aggregate(&records));
        let datasets = series.datasets();
        assert_eq!(datasets.len(), 3);
        assert_eq!(datasets[0].label, "Response Time (ms)");
        assert_eq!(datasets[0].values, vec![20.0, 40.0]);
        assert_eq!(datasets[1].values, vec![0.2, 0.2]);
        assert_eq!(datasets[2].label, "Error Rate (%)");
        assert_eq!(datasets[2].values, vec![0.0, 100.0]);
    }
}
