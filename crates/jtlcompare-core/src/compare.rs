use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analysis::{ApdexResult, EndpointStatistics, Statistics, TOTAL_LABEL};
use crate::error::JtlError;
use crate::upload::ProcessedFile;

// ---------------------------------------------------------------------------
// ComparisonMetric
// ---------------------------------------------------------------------------

/// A per-label statistic that can be compared between two files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonMetric {
    Average,
    Median,
    Min,
    Max,
    Percentile90,
    Percentile95,
    Percentile99,
    Throughput,
    ErrorPercentage,
    Count,
}

impl ComparisonMetric {
    pub const ALL: [ComparisonMetric; 10] = [
        ComparisonMetric::Average,
        ComparisonMetric::Median,
        ComparisonMetric::Min,
        ComparisonMetric::Max,
        ComparisonMetric::Percentile90,
        ComparisonMetric::Percentile95,
        ComparisonMetric::Percentile99,
        ComparisonMetric::Throughput,
        ComparisonMetric::ErrorPercentage,
        ComparisonMetric::Count,
    ];

    /// Metrics compared when the caller does not choose.
    pub const DEFAULT: [ComparisonMetric; 5] = [
        ComparisonMetric::Average,
        ComparisonMetric::Median,
        ComparisonMetric::Percentile95,
        ComparisonMetric::Throughput,
        ComparisonMetric::ErrorPercentage,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ComparisonMetric::Average => "average",
            ComparisonMetric::Median => "median",
            ComparisonMetric::Min => "min",
            ComparisonMetric::Max => "max",
            ComparisonMetric::Percentile90 => "percentile90",
            ComparisonMetric::Percentile95 => "percentile95",
            ComparisonMetric::Percentile99 => "percentile99",
            ComparisonMetric::Throughput => "throughput",
            ComparisonMetric::ErrorPercentage => "errorPercentage",
            ComparisonMetric::Count => "count",
        }
    }

    /// Human-readable column title.
    pub fn label(self) -> &'static str {
        match self {
            ComparisonMetric::Average => "Average (ms)",
            ComparisonMetric::Median => "Median (ms)",
            ComparisonMetric::Min => "Min (ms)",
            ComparisonMetric::Max => "Max (ms)",
            ComparisonMetric::Percentile90 => "90th Percentile (ms)",
            ComparisonMetric::Percentile95 => "95th Percentile (ms)",
            ComparisonMetric::Percentile99 => "99th Percentile (ms)",
            ComparisonMetric::Throughput => "Throughput (req/s)",
            ComparisonMetric::ErrorPercentage => "Error Rate (%)",
            ComparisonMetric::Count => "Sample Count",
        }
    }

    pub fn value(self, stats: &EndpointStatistics) -> f64 {
        match self {
            ComparisonMetric::Average => stats.average,
            ComparisonMetric::Median => stats.median,
            ComparisonMetric::Min => stats.min,
            ComparisonMetric::Max => stats.max,
            ComparisonMetric::Percentile90 => stats.percentile90,
            ComparisonMetric::Percentile95 => stats.percentile95,
            ComparisonMetric::Percentile99 => stats.percentile99,
            ComparisonMetric::Throughput => stats.throughput,
            ComparisonMetric::ErrorPercentage => stats.error_percentage,
            ComparisonMetric::Count => stats.count as f64,
        }
    }

    /// Throughput and sample count improve upward; latencies and error
    /// rate improve downward.
    pub fn higher_is_better(self) -> bool {
        matches!(self, ComparisonMetric::Throughput | ComparisonMetric::Count)
    }

    /// Render a value the way the comparison table shows it.
    pub fn format_value(self, value: f64) -> String {
        match self {
            ComparisonMetric::ErrorPercentage => format!("{value:.2}%"),
            ComparisonMetric::Throughput => format!("{value:.2}"),
            ComparisonMetric::Count => format!("{value}"),
            _ => format!("{value:.0} ms"),
        }
    }
}

impl std::fmt::Display for ComparisonMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ComparisonMetric {
    type Err = JtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComparisonMetric::ALL
            .into_iter()
            .find(|m| m.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| JtlError::Validation(format!("Unknown comparison metric '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Difference / DiffMode
// ---------------------------------------------------------------------------

/// Change from a baseline value to a candidate value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Difference {
    /// `candidate - baseline`.
    pub absolute: f64,
    /// `absolute / baseline * 100`; 0 when the baseline is 0.
    pub percentage: f64,
}

impl Difference {
    pub fn between(baseline: f64, candidate: f64) -> Self {
        let absolute = candidate - baseline;
        let percentage = if baseline == 0.0 {
            0.0
        } else {
            absolute / baseline * 100.0
        };
        Self {
            absolute,
            percentage,
        }
    }
}

/// How a [`Difference`] is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffMode {
    Absolute,
    Percentage,
    #[default]
    Hybrid,
}

impl DiffMode {
    pub fn render(self, diff: &Difference) -> String {
        match self {
            DiffMode::Absolute => format!("{:.2}", diff.absolute),
            DiffMode::Percentage => format!("{:.2}%", diff.percentage),
            DiffMode::Hybrid => format!("{:.2} ({:.2}%)", diff.absolute, diff.percentage),
        }
    }
}

impl FromStr for DiffMode {
    type Err = JtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "absolute" => Ok(DiffMode::Absolute),
            "percentage" => Ok(DiffMode::Percentage),
            "hybrid" => Ok(DiffMode::Hybrid),
            other => Err(JtlError::Validation(format!("Unknown diff mode '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Verdicts and comparison rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Better,
    Worse,
    Unchanged,
}

impl Verdict {
    /// A change is significant when `|percentage| >= threshold`, or when the
    /// baseline is 0 and the candidate is not. Equal values are always
    /// unchanged, whatever the threshold.
    pub fn judge(
        metric: ComparisonMetric,
        baseline: f64,
        diff: &Difference,
        significance_threshold: f64,
    ) -> Self {
        let significant = diff.absolute != 0.0
            && (baseline == 0.0 || diff.percentage.abs() >= significance_threshold);
        if !significant {
            return Verdict::Unchanged;
        }
        let increased = diff.absolute > 0.0;
        if increased == metric.higher_is_better() {
            Verdict::Better
        } else {
            Verdict::Worse
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricComparison {
    pub metric: ComparisonMetric,
    pub baseline: f64,
    pub candidate: f64,
    pub difference: Difference,
    pub verdict: Verdict,
}

/// One label compared across two files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointComparison {
    pub label: String,
    pub in_baseline: bool,
    pub in_candidate: bool,
    pub metrics: Vec<MetricComparison>,
}

/// Options controlling [`compare_statistics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonOptions {
    pub metrics: Vec<ComparisonMetric>,
    /// Percent change below which a difference is reported as unchanged.
    pub significance_threshold: f64,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            metrics: ComparisonMetric::DEFAULT.to_vec(),
            significance_threshold: 5.0,
        }
    }
}

fn compare_endpoint(
    label: &str,
    baseline: Option<&EndpointStatistics>,
    candidate: Option<&EndpointStatistics>,
    options: &ComparisonOptions,
) -> EndpointComparison {
    let empty = EndpointStatistics::default();
    let a = baseline.unwrap_or(&empty);
    let b = candidate.unwrap_or(&empty);

    let metrics = options
        .metrics
        .iter()
        .map(|&metric| {
            let base = metric.value(a);
            let cand = metric.value(b);
            let difference = Difference::between(base, cand);
            MetricComparison {
                metric,
                baseline: base,
                candidate: cand,
                difference,
                verdict: Verdict::judge(metric, base, &difference, options.significance_threshold),
            }
        })
        .collect();

    EndpointComparison {
        label: label.to_string(),
        in_baseline: baseline.is_some(),
        in_candidate: candidate.is_some(),
        metrics,
    }
}

/// Compare two files label by label.
///
/// Covers the union of both files' labels in ascending order, followed by a
/// `Total` row. A label missing from one side reads as all zeros there.
pub fn compare_statistics(
    baseline: &Statistics,
    candidate: &Statistics,
    options: &ComparisonOptions,
) -> Vec<EndpointComparison> {
    let labels: BTreeSet<&str> = baseline
        .by_label
        .keys()
        .chain(candidate.by_label.keys())
        .map(String::as_str)
        .collect();

    let mut rows: Vec<EndpointComparison> = labels
        .into_iter()
        .map(|label| {
            compare_endpoint(
                label,
                baseline.by_label.get(label),
                candidate.by_label.get(label),
                options,
            )
        })
        .collect();

    let (total_a, total_b) = (baseline.total(), candidate.total());
    rows.push(compare_endpoint(
        TOTAL_LABEL,
        Some(&total_a),
        Some(&total_b),
        options,
    ));
    rows
}

// ---------------------------------------------------------------------------
// APDEX comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApdexComparison {
    pub label: String,
    pub baseline_score: Option<f64>,
    pub candidate_score: Option<f64>,
    /// Candidate minus baseline; present only when both sides have a score.
    pub delta: Option<f64>,
}

pub fn compare_apdex(
    baseline: &BTreeMap<String, ApdexResult>,
    candidate: &BTreeMap<String, ApdexResult>,
) -> Vec<ApdexComparison> {
    let labels: BTreeSet<&String> = baseline.keys().chain(candidate.keys()).collect();
    labels
        .into_iter()
        .map(|label| {
            let a = baseline.get(label).map(|r| r.score);
            let b = candidate.get(label).map(|r| r.score);
            ApdexComparison {
                label: label.clone(),
                baseline_score: a,
                candidate_score: b,
                delta: a.zip(b).map(|(a, b)| b - a),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// FileComparison
// ---------------------------------------------------------------------------

/// Full comparison of a baseline file against a candidate file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileComparison {
    pub baseline_name: String,
    pub baseline_version: String,
    pub candidate_name: String,
    pub candidate_version: String,
    pub significance_threshold: f64,
    pub endpoints: Vec<EndpointComparison>,
    pub apdex: Vec<ApdexComparison>,
}

impl FileComparison {
    /// Rows with at least one metric judged worse.
    pub fn regressions(&self) -> impl Iterator<Item = &EndpointComparison> {
        self.endpoints
            .iter()
            .filter(|e| e.metrics.iter().any(|m| m.verdict == Verdict::Worse))
    }
}

pub fn compare_files(
    baseline: &ProcessedFile,
    candidate: &ProcessedFile,
    options: &ComparisonOptions,
) -> FileComparison {
    FileComparison {
        baseline_name: baseline.name.clone(),
        baseline_version: baseline.result.jmeter_version_or_unknown().to_string(),
        candidate_name: candidate.name.clone(),
        candidate_version: candidate.result.jmeter_version_or_unknown().to_string(),
        significance_threshold: options.significance_threshold,
        endpoints: compare_statistics(
            &baseline.result.statistics,
            &candidate.result.statistics,
            options,
        ),
        apdex: compare_apdex(
            &baseline.result.apdex_by_label,
            &candidate.result.apdex_by_label,
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ApdexThresholds;
    use crate::processor::process_jtl;

    fn stats_with(label: &str, average: f64, throughput: f64, error_percentage: f64) -> Statistics {
        let row = EndpointStatistics {
            count: 10,
            average,
            throughput,
            error_percentage,
            ..Default::default()
        };
        let mut stats = Statistics {
            total_samples: 10,
            avg_response_time: average,
            throughput,
            error_percentage,
            ..Default::default()
        };
        stats.by_label.insert(label.to_string(), row);
        stats
    }

    fn processed(name: &str, raw: &str) -> ProcessedFile {
        ProcessedFile {
            name: name.to_string(),
            size_bytes: raw.len() as u64,
            result: process_jtl(raw, &ApdexThresholds::default()).expect("processing should succeed"),
        }
    }

    // -----------------------------------------------------------------------
    // Difference / DiffMode
    // -----------------------------------------------------------------------

    #[test]
    fn difference_absolute_and_percentage() {
        let diff = Difference::between(200.0, 250.0);
        assert_eq!(diff.absolute, 50.0);
        assert_eq!(diff.percentage, 25.0);
    }

    #[test]
    fn difference_from_zero_baseline_has_zero_percentage() {
        let diff = Difference::between(0.0, 10.0);
        assert_eq!(diff.absolute, 10.0);
        assert_eq!(diff.percentage, 0.0);
    }

    #[test]
    fn diff_mode_rendering() {
        let diff = Difference::between(300.0, 312.0);
        assert_eq!(DiffMode::Absolute.render(&diff), "12.00");
        assert_eq!(DiffMode::Percentage.render(&diff), "4.00%");
        assert_eq!(DiffMode::Hybrid.render(&diff), "12.00 (4.00%)");
    }

    #[test]
    fn diff_mode_parsing() {
        assert_eq!("absolute".parse::<DiffMode>().ok(), Some(DiffMode::Absolute));
        assert_eq!("Hybrid".parse::<DiffMode>().ok(), Some(DiffMode::Hybrid));
        assert!("relative".parse::<DiffMode>().is_err());
        assert_eq!(DiffMode::default(), DiffMode::Hybrid);
    }

    // -----------------------------------------------------------------------
    // ComparisonMetric
    // -----------------------------------------------------------------------

    #[test]
    fn metric_parsing_accepts_keys() {
        assert_eq!(
            "errorPercentage".parse::<ComparisonMetric>().ok(),
            Some(ComparisonMetric::ErrorPercentage)
        );
        assert_eq!(
            "percentile95".parse::<ComparisonMetric>().ok(),
            Some(ComparisonMetric::Percentile95)
        );
        assert!("p42".parse::<ComparisonMetric>().is_err());
    }

    #[test]
    fn metric_labels_and_formatting() {
        assert_eq!(ComparisonMetric::Percentile90.label(), "90th Percentile (ms)");
        assert_eq!(ComparisonMetric::Count.label(), "Sample Count");
        assert_eq!(ComparisonMetric::ErrorPercentage.format_value(2.5), "2.50%");
        assert_eq!(ComparisonMetric::Average.format_value(120.4), "120 ms");
        assert_eq!(ComparisonMetric::Throughput.format_value(3.14159), "3.14");
    }

    // -----------------------------------------------------------------------
    // Verdict
    // -----------------------------------------------------------------------

    #[test]
    fn small_changes_are_unchanged() {
        let diff = Difference::between(100.0, 104.0);
        assert_eq!(
            Verdict::judge(ComparisonMetric::Average, 100.0, &diff, 5.0),
            Verdict::Unchanged
        );
    }

    #[test]
    fn slower_latency_is_worse() {
        let diff = Difference::between(100.0, 120.0);
        assert_eq!(
            Verdict::judge(ComparisonMetric::Average, 100.0, &diff, 5.0),
            Verdict::Worse
        );
    }

    #[test]
    fn higher_throughput_is_better() {
        let diff = Difference::between(10.0, 12.0);
        assert_eq!(
            Verdict::judge(ComparisonMetric::Throughput, 10.0, &diff, 5.0),
            Verdict::Better
        );
    }

    #[test]
    fn equal_values_are_unchanged_at_zero_threshold() {
        let same = Difference::between(100.0, 100.0);
        assert_eq!(
            Verdict::judge(ComparisonMetric::Average, 100.0, &same, 0.0),
            Verdict::Unchanged
        );
        let same = Difference::between(10.0, 10.0);
        assert_eq!(
            Verdict::judge(ComparisonMetric::Throughput, 10.0, &same, 0.0),
            Verdict::Unchanged
        );
        let both_zero = Difference::between(0.0, 0.0);
        assert_eq!(
            Verdict::judge(ComparisonMetric::ErrorPercentage, 0.0, &both_zero, 0.0),
            Verdict::Unchanged
        );
    }

    #[test]
    fn any_change_counts_at_zero_threshold() {
        let diff = Difference::between(100.0, 101.0);
        assert_eq!(
            Verdict::judge(ComparisonMetric::Average, 100.0, &diff, 0.0),
            Verdict::Worse
        );
    }

    #[test]
    fn errors_appearing_from_zero_are_worse() {
        let diff = Difference::between(0.0, 5.0);
        assert_eq!(
            Verdict::judge(ComparisonMetric::ErrorPercentage, 0.0, &diff, 5.0),
            Verdict::Worse
        );
    }

    // -----------------------------------------------------------------------
    // compare_statistics
    // -----------------------------------------------------------------------

    #[test]
    fn union_of_labels_sorted_with_total_last() {
        let a = stats_with("search", 100.0, 10.0, 0.0);
        let b = stats_with("checkout", 100.0, 10.0, 0.0);
        let rows = compare_statistics(&a, &b, &ComparisonOptions::default());
        let labels: Vec<_> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["checkout", "search", TOTAL_LABEL]);
        assert!(!rows[0].in_baseline && rows[0].in_candidate);
        assert!(rows[1].in_baseline && !rows[1].in_candidate);
    }

    #[test]
    fn missing_side_reads_as_zero() {
        let a = stats_with("search", 100.0, 10.0, 0.0);
        let b = Statistics::default();
        let rows = compare_statistics(&a, &b, &ComparisonOptions::default());
        let avg = &rows[0].metrics[0];
        assert_eq!(avg.metric, ComparisonMetric::Average);
        assert_eq!(avg.baseline, 100.0);
        assert_eq!(avg.candidate, 0.0);
        assert_eq!(avg.difference.percentage, -100.0);
    }

    #[test]
    fn only_selected_metrics_are_compared() {
        let a = stats_with("x", 100.0, 10.0, 0.0);
        let b = stats_with("x", 150.0, 10.0, 0.0);
        let options = ComparisonOptions {
            metrics: vec![ComparisonMetric::Average],
            significance_threshold: 10.0,
        };
        let rows = compare_statistics(&a, &b, &options);
        assert_eq!(rows[0].metrics.len(), 1);
        assert_eq!(rows[0].metrics[0].verdict, Verdict::Worse);
    }

    // -----------------------------------------------------------------------
    // compare_apdex / compare_files
    // -----------------------------------------------------------------------

    #[test]
    fn apdex_delta_only_when_both_sides_scored() {
        let a = processed("a.jtl", "timeStamp,elapsed,label,success\n0,100,x,true\n0,100,y,true\n");
        let b = processed("b.jtl", "timeStamp,elapsed,label,success\n0,1000,x,true\n0,10,z,true\n");
        let rows = compare_apdex(&a.result.apdex_by_label, &b.result.apdex_by_label);
        let labels: Vec<_> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["x", "y", "z"]);
        assert_eq!(rows[0].delta, Some(-0.5));
        assert_eq!(rows[1].delta, None);
        assert_eq!(rows[2].baseline_score, None);
    }

    #[test]
    fn compare_files_reports_regressions() {
        let a = processed(
            "before.jtl",
            "# JMeter 5.5\ntimeStamp,elapsed,label,success\n0,100,login,true\n1000,100,login,true\n",
        );
        let b = processed(
            "after.jtl",
            "timeStamp,elapsed,label,success\n0,300,login,true\n1000,300,login,false\n",
        );
        let cmp = compare_files(&a, &b, &ComparisonOptions::default());
        assert_eq!(cmp.baseline_name, "before.jtl");
        assert_eq!(cmp.baseline_version, "JMeter 5.5");
        assert_eq!(cmp.candidate_version, "Unknown Version");
        let regressed: Vec<_> = cmp.regressions().map(|e| e.label.as_str()).collect();
        assert_eq!(regressed, vec!["login", TOTAL_LABEL]);
    }
}
