use std::fmt;

use jtlcompare_core::compare::{DiffMode, FileComparison, Verdict};
use jtlcompare_core::history::HistoryEntry;
use jtlcompare_core::upload::ProcessedFile;

fn label_width<'a>(labels: impl Iterator<Item = &'a str>, header: &str) -> usize {
    labels.map(str::len).chain([header.len()]).max().unwrap_or(0)
}

// ---------------------------------------------------------------------------
// FileSummary
// ---------------------------------------------------------------------------

/// Text summary of one processed file.
pub struct FileSummary<'a>(pub &'a ProcessedFile);

impl fmt::Display for FileSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = self.0;
        let r = &file.result;
        let s = &r.statistics;

        writeln!(f, "{} ({})", file.name, r.jmeter_version_or_unknown())?;
        writeln!(
            f,
            "  Samples: {}  Errors: {:.2}%  Duration: {:.1}s  Throughput: {:.2}/s",
            s.total_samples, s.error_percentage, s.duration_secs, s.throughput
        )?;
        writeln!(
            f,
            "  Avg: {:.2} ms  Median: {:.0} ms  P90: {:.0} ms  P95: {:.0} ms  P99: {:.0} ms  Min: {:.0} ms  Max: {:.0} ms",
            s.avg_response_time,
            s.median_response_time,
            s.percentile90,
            s.percentile95,
            s.percentile99,
            s.min_response_time,
            s.max_response_time
        )?;
        writeln!(
            f,
            "  Received: {:.2} KB/s  Sent: {:.2} KB/s",
            s.received_kb_per_sec, s.sent_kb_per_sec
        )?;
        if !r.warnings.is_empty() {
            writeln!(
                f,
                "  {} malformed numeric field(s) were counted as 0",
                r.warnings.len()
            )?;
        }

        let rows = s.rows();
        let width = label_width(rows.iter().map(|(label, _)| *label), "Label");
        writeln!(
            f,
            "\n  {:<width$}  {:>8}  {:>8}  {:>10}  {:>8}  {:>10}  {:>6}  {}",
            "Label", "Count", "Error %", "Avg (ms)", "P95 (ms)", "Throughput", "Apdex", "Rating"
        )?;
        for (label, row) in &rows {
            let (score, rating) = r
                .apdex_by_label
                .get(*label)
                .map(|a| (format!("{:.2}", a.score), a.rating.to_string()))
                .unwrap_or_else(|| ("-".to_string(), String::new()));
            writeln!(
                f,
                "  {:<width$}  {:>8}  {:>8.2}  {:>10.2}  {:>8.0}  {:>10.2}  {:>6}  {}",
                label,
                row.count,
                row.error_percentage,
                row.average,
                row.percentile95,
                row.throughput,
                score,
                rating
            )?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Overview
// ---------------------------------------------------------------------------

/// One line per file, as listed by the history.
pub struct Overview<'a>(pub &'a [HistoryEntry]);

impl fmt::Display for Overview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.0;
        let width = label_width(entries.iter().map(|e| e.name.as_str()), "File");
        writeln!(
            f,
            "{:<width$}  {:<20}  {:>8}  {:>10}  {:>8}  {:>10}",
            "File", "Version", "Samples", "Avg (ms)", "Error %", "Throughput"
        )?;
        for e in entries {
            writeln!(
                f,
                "{:<width$}  {:<20}  {:>8}  {:>10.2}  {:>8.2}  {:>10.2}",
                e.name, e.jmeter_version, e.total_samples, e.avg_response_time, e.error_percentage, e.throughput
            )?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ComparisonTable
// ---------------------------------------------------------------------------

fn verdict_marker(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Better => "better",
        Verdict::Worse => "WORSE",
        Verdict::Unchanged => "",
    }
}

/// Endpoint-by-endpoint comparison table followed by APDEX deltas.
pub struct ComparisonTable<'a> {
    pub comparison: &'a FileComparison,
    pub mode: DiffMode,
}

impl fmt::Display for ComparisonTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cmp = self.comparison;
        writeln!(f, "Baseline:  {} ({})", cmp.baseline_name, cmp.baseline_version)?;
        writeln!(f, "Candidate: {} ({})", cmp.candidate_name, cmp.candidate_version)?;
        writeln!(
            f,
            "Changes under {:.2}% are reported as unchanged.\n",
            cmp.significance_threshold
        )?;

        let width = label_width(cmp.endpoints.iter().map(|e| e.label.as_str()), "Endpoint");
        writeln!(
            f,
            "{:<width$}  {:<22}  {:>14}  {:>14}  {:>22}  {}",
            "Endpoint", "Metric", "Baseline", "Candidate", "Difference", "Verdict"
        )?;
        for endpoint in &cmp.endpoints {
            let presence = match (endpoint.in_baseline, endpoint.in_candidate) {
                (true, false) => " [baseline only]",
                (false, true) => " [candidate only]",
                _ => "",
            };
            for (i, row) in endpoint.metrics.iter().enumerate() {
                let label = if i == 0 { endpoint.label.as_str() } else { "" };
                writeln!(
                    f,
                    "{:<width$}  {:<22}  {:>14}  {:>14}  {:>22}  {}{}",
                    label,
                    row.metric.label(),
                    row.metric.format_value(row.baseline),
                    row.metric.format_value(row.candidate),
                    self.mode.render(&row.difference),
                    verdict_marker(row.verdict),
                    if i == 0 { presence } else { "" }
                )?;
            }
        }

        if !cmp.apdex.is_empty() {
            writeln!(f, "\nAPDEX")?;
            let score = |s: Option<f64>| s.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string());
            for row in &cmp.apdex {
                let delta = row
                    .delta
                    .map(|d| format!("{d:+.2}"))
                    .unwrap_or_else(|| "-".to_string());
                writeln!(
                    f,
                    "{:<width$}  {:>6}  {:>6}  {:>6}",
                    row.label,
                    score(row.baseline_score),
                    score(row.candidate_score),
                    delta
                )?;
            }
        }

        writeln!(f, "\n{} endpoint(s) regressed", cmp.regressions().count())
    }
}
