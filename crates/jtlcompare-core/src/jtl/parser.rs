use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::JtlError;
use crate::jtl::column::{ColumnLayout, JtlColumn};
use crate::jtl::record::JtlRecord;

/// Date layouts JMeter writes when `timestamp_format` is not `ms`.
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y/%m/%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

// ---------------------------------------------------------------------------
// Parse output
// ---------------------------------------------------------------------------

/// A numeric field that could not be read and was recorded as `0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldWarning {
    /// 1-based line number within the file.
    pub line: usize,
    pub column: JtlColumn,
    pub value: String,
}

impl std::fmt::Display for FieldWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: column '{}' has non-numeric value '{}', using 0",
            self.line, self.column, self.value
        )
    }
}

/// Records of one file plus the fields that had to be coerced.
#[derive(Debug, Clone, Default)]
pub struct ParsedJtl {
    pub layout: ColumnLayout,
    pub records: Vec<JtlRecord>,
    pub warnings: Vec<FieldWarning>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse the full text of a CSV JTL file.
///
/// Leading `#` comment lines are skipped, the first remaining line is the
/// header, and every later non-blank line becomes one record. Only the
/// columns found in the header are set on each record. Fails when there is
/// no header with at least one known column, or when no data rows follow it.
pub fn parse_jtl(raw: &str) -> Result<ParsedJtl, JtlError> {
    let text = raw.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        return Err(JtlError::Parse("input is empty".to_string()));
    }

    let mut lines = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .enumerate()
        .skip_while(|(_, l)| l.trim().is_empty() || l.starts_with('#'));

    let (_, header) = lines
        .next()
        .ok_or_else(|| JtlError::Parse("no header row".to_string()))?;
    let header_cells: Vec<&str> = header.split(',').collect();
    let layout = ColumnLayout::from_header(&header_cells);
    if layout.is_empty() {
        return Err(JtlError::Parse(
            "header row contains no recognised JTL columns".to_string(),
        ));
    }

    let mut records = Vec::new();
    let mut warnings = Vec::new();
    for (idx, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_fields(line);
        records.push(build_record(&layout, &fields, idx + 1, &mut warnings));
    }

    if records.is_empty() {
        return Err(JtlError::Parse("no data rows after header".to_string()));
    }

    tracing::debug!(
        records = records.len(),
        columns = layout.columns().count(),
        "parsed JTL data"
    );
    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            first = %warnings[0],
            "malformed numeric fields coerced to 0"
        );
    }

    Ok(ParsedJtl {
        layout,
        records,
        warnings,
    })
}

/// Split one data line into trimmed fields.
///
/// Each `"` flips the in-quotes state and is dropped, so commas inside a
/// quoted section stay part of the field.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

fn build_record(
    layout: &ColumnLayout,
    fields: &[String],
    line: usize,
    warnings: &mut Vec<FieldWarning>,
) -> JtlRecord {
    let mut record = JtlRecord::default();

    for (column, idx) in layout.columns() {
        // Short rows leave their trailing columns unset.
        let Some(value) = fields.get(idx) else {
            continue;
        };
        let value = value.as_str();

        match column {
            JtlColumn::TimeStamp => {
                let ts = if value.is_empty() {
                    Some(0)
                } else {
                    parse_timestamp(value)
                };
                record.timestamp = Some(ts.unwrap_or_else(|| {
                    warnings.push(FieldWarning {
                        line,
                        column,
                        value: value.to_string(),
                    });
                    0
                }));
            }
            JtlColumn::Elapsed => {
                record.elapsed_ms = Some(parse_count(value, line, column, warnings))
            }
            JtlColumn::Bytes => {
                record.bytes_received = Some(parse_count(value, line, column, warnings))
            }
            JtlColumn::SentBytes => {
                record.bytes_sent = Some(parse_count(value, line, column, warnings))
            }
            JtlColumn::GrpThreads => {
                record.group_threads = Some(parse_count(value, line, column, warnings))
            }
            JtlColumn::AllThreads => {
                record.all_threads = Some(parse_count(value, line, column, warnings))
            }
            JtlColumn::Latency => {
                record.latency_ms = Some(parse_count(value, line, column, warnings))
            }
            JtlColumn::IdleTime => {
                record.idle_time_ms = Some(parse_count(value, line, column, warnings))
            }
            JtlColumn::Connect => {
                record.connect_ms = Some(parse_count(value, line, column, warnings))
            }
            JtlColumn::Success => record.success = Some(value.eq_ignore_ascii_case("true")),
            JtlColumn::Label => record.label = Some(value.to_string()),
            JtlColumn::ResponseCode => record.response_code = Some(value.to_string()),
            JtlColumn::ResponseMessage => record.response_message = Some(value.to_string()),
            JtlColumn::ThreadName => record.thread_name = Some(value.to_string()),
            JtlColumn::DataType => record.data_type = Some(value.to_string()),
            JtlColumn::FailureMessage => record.failure_message = Some(value.to_string()),
            JtlColumn::Url => record.url = Some(value.to_string()),
        }
    }

    record
}

/// Non-negative integer; empty is 0, anything unreadable is 0 plus a warning.
fn parse_count(
    value: &str,
    line: usize,
    column: JtlColumn,
    warnings: &mut Vec<FieldWarning>,
) -> u64 {
    if value.is_empty() {
        return 0;
    }
    value.parse::<u64>().unwrap_or_else(|_| {
        warnings.push(FieldWarning {
            line,
            column,
            value: value.to_string(),
        });
        0
    })
}

/// Epoch milliseconds, or one of the JMeter date layouts read as UTC.
fn parse_timestamp(value: &str) -> Option<i64> {
    if let Ok(ms) = value.parse::<i64>() {
        return Some(ms);
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
