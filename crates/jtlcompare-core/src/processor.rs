use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::{
    aggregate, bucket_time_series, score_apdex, ApdexResult, ApdexThresholds, Statistics,
    TimeSeries,
};
use crate::error::JtlError;
use crate::jtl::{extract_jmeter_version, parse_jtl, FieldWarning, JtlRecord};

/// Shown in place of a version the file does not state.
pub const UNKNOWN_VERSION: &str = "Unknown Version";

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Receives progress checkpoints between pipeline stages.
///
/// Called synchronously at 20, 40, 60, 80 and 100 percent.
pub trait ProgressObserver {
    fn on_progress(&mut self, percent: u8, message: &str);
}

impl<F> ProgressObserver for F
where
    F: FnMut(u8, &str),
{
    fn on_progress(&mut self, percent: u8, message: &str) {
        self(percent, message)
    }
}

/// Observer that ignores every checkpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _percent: u8, _message: &str) {}
}

// ---------------------------------------------------------------------------
// ProcessedResult
// ---------------------------------------------------------------------------

/// Everything derived from one result file.
///
/// Owned by the caller; nothing is retained by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedResult {
    pub records: Vec<JtlRecord>,
    pub statistics: Statistics,
    pub apdex_by_label: BTreeMap<String, ApdexResult>,
    pub time_series: TimeSeries,
    pub jmeter_version: Option<String>,
    /// Numeric fields that were unreadable and counted as 0.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<FieldWarning>,
}

impl ProcessedResult {
    pub fn jmeter_version_or_unknown(&self) -> &str {
        self.jmeter_version.as_deref().unwrap_or(UNKNOWN_VERSION)
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full pipeline on the text of one file.
pub fn process_jtl(raw: &str, thresholds: &ApdexThresholds) -> Result<ProcessedResult, JtlError> {
    process_jtl_with_progress(raw, thresholds, &mut NoProgress)
}

/// Run the full pipeline, reporting progress between stages.
///
/// Parse, then statistics, APDEX and time series. Fails only for invalid
/// thresholds or unparseable input; nothing is reported to `progress` after
/// a failure.
pub fn process_jtl_with_progress(
    raw: &str,
    thresholds: &ApdexThresholds,
    progress: &mut dyn ProgressObserver,
) -> Result<ProcessedResult, JtlError> {
    thresholds.validate()?;

    progress.on_progress(20, "Parsing JTL data...");
    let jmeter_version = extract_jmeter_version(raw);
    let parsed = parse_jtl(raw)?;

    progress.on_progress(40, "Calculating statistics...");
    let statistics = aggregate(&parsed.records);

    progress.on_progress(60, "Calculating APDEX scores...");
    let apdex_by_label = score_apdex(&parsed.records, thresholds);

    progress.on_progress(80, "Preparing visualization data...");
    let time_series = bucket_time_series(&parsed.records, &statistics);

    progress.on_progress(100, "Processing complete");
    tracing::info!(
        samples = statistics.total_samples,
        labels = statistics.by_label.len(),
        warnings = parsed.warnings.len(),
        version = jmeter_version.as_deref().unwrap_or(UNKNOWN_VERSION),
        "processed JTL file"
    );

    Ok(ProcessedResult {
        records: parsed.records,
        statistics,
        apdex_by_label,
        time_series,
        jmeter_version,
        warnings: parsed.warnings,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
