use crate::compare::FileComparison;
use crate::error::JtlError;
use crate::jtl::{JtlColumn, JtlRecord};
use crate::processor::ProcessedResult;
use crate::upload::ProcessedFile;

const STATISTICS_HEADER: [&str; 12] = [
    "File",
    "Label",
    "Count",
    "Error %",
    "Average (ms)",
    "Median (ms)",
    "90% Line (ms)",
    "95% Line (ms)",
    "99% Line (ms)",
    "Min (ms)",
    "Max (ms)",
    "Throughput (/sec)",
];

const APDEX_HEADER: [&str; 7] = [
    "File",
    "Label",
    "Satisfied",
    "Tolerated",
    "Frustrated",
    "Score",
    "Rating",
];

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, JtlError> {
    let bytes = writer.into_inner().map_err(|e| JtlError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| JtlError::Internal(format!("CSV output is not UTF-8: {e}")))
}

// ---------------------------------------------------------------------------
// Statistics / APDEX
// ---------------------------------------------------------------------------

/// One row per file per label, each file followed by its `Total` row.
pub fn export_statistics_csv(files: &[ProcessedFile]) -> Result<String, JtlError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(STATISTICS_HEADER)?;

    for file in files {
        for (label, s) in file.result.statistics.rows() {
            writer.write_record([
                file.name.clone(),
                label.to_string(),
                s.count.to_string(),
                format!("{:.2}", s.error_percentage),
                format!("{:.2}", s.average),
                format!("{:.0}", s.median),
                format!("{:.0}", s.percentile90),
                format!("{:.0}", s.percentile95),
                format!("{:.0}", s.percentile99),
                format!("{:.0}", s.min),
                format!("{:.0}", s.max),
                format!("{:.2}", s.throughput),
            ])?;
        }
    }
    finish(writer)
}

pub fn export_apdex_csv(files: &[ProcessedFile]) -> Result<String, JtlError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(APDEX_HEADER)?;

    for file in files {
        for (label, apdex) in &file.result.apdex_by_label {
            writer.write_record([
                file.name.clone(),
                label.clone(),
                apdex.satisfied.to_string(),
                apdex.tolerated.to_string(),
                apdex.frustrated.to_string(),
                format!("{:.2}", apdex.score),
                apdex.rating.to_string(),
            ])?;
        }
    }
    finish(writer)
}

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

/// A field as it should appear in the export; absent fields are empty.
fn field_text(record: &JtlRecord, column: JtlColumn) -> String {
    fn num<T: ToString>(value: Option<T>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }
    fn text(value: &Option<String>) -> String {
        value.clone().unwrap_or_default()
    }

    match column {
        JtlColumn::TimeStamp => num(record.timestamp),
        JtlColumn::Elapsed => num(record.elapsed_ms),
        JtlColumn::Label => text(&record.label),
        JtlColumn::ResponseCode => text(&record.response_code),
        JtlColumn::ResponseMessage => text(&record.response_message),
        JtlColumn::ThreadName => text(&record.thread_name),
        JtlColumn::DataType => text(&record.data_type),
        JtlColumn::Success => num(record.success),
        JtlColumn::FailureMessage => text(&record.failure_message),
        JtlColumn::Bytes => num(record.bytes_received),
        JtlColumn::SentBytes => num(record.bytes_sent),
        JtlColumn::GrpThreads => num(record.group_threads),
        JtlColumn::AllThreads => num(record.all_threads),
        JtlColumn::Url => text(&record.url),
        JtlColumn::Latency => num(record.latency_ms),
        JtlColumn::IdleTime => num(record.idle_time_ms),
        JtlColumn::Connect => num(record.connect_ms),
    }
}

/// Every record of every file under the standard JTL header, prefixed with
/// the file name.
pub fn export_records_csv(files: &[ProcessedFile]) -> Result<String, JtlError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let header = std::iter::once("File").chain(JtlColumn::ALL.iter().map(|c| c.header_name()));
    writer.write_record(header)?;

    for file in files {
        for record in &file.result.records {
            let row = std::iter::once(file.name.clone())
                .chain(JtlColumn::ALL.iter().map(|&c| field_text(record, c)));
            writer.write_record(row)?;
        }
    }
    finish(writer)
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// One row per endpoint per compared metric.
pub fn export_comparison_csv(comparison: &FileComparison) -> Result<String, JtlError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Endpoint".to_string(),
        "Metric".to_string(),
        format!("{} ({})", comparison.baseline_name, comparison.baseline_version),
        format!("{} ({})", comparison.candidate_name, comparison.candidate_version),
        "Difference".to_string(),
        "% Difference".to_string(),
    ])?;

    for endpoint in &comparison.endpoints {
        for row in &endpoint.metrics {
            writer.write_record([
                endpoint.label.clone(),
                row.metric.label().to_string(),
                format!("{:.2}", row.baseline),
                format!("{:.2}", row.candidate),
                format!("{:.2}", row.difference.absolute),
                format!("{:.2}%", row.difference.percentage),
            ])?;
        }
    }
    finish(writer)
}

// ---------------------------------------------------------------------------
// JSON export
// ---------------------------------------------------------------------------

/// Export a processed result as pretty-printed JSON.
pub fn export_json(result: &ProcessedResult) -> Result<String, JtlError> {
    Ok(serde_json::to_string_pretty(result)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
