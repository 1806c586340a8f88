use serde::{Deserialize, Serialize};

/// A column JMeter may write into a CSV result file.
///
/// Which of these are present depends on the `jmeter.save.saveservice.*`
/// properties of the run that produced the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JtlColumn {
    TimeStamp,
    Elapsed,
    Label,
    ResponseCode,
    ResponseMessage,
    ThreadName,
    DataType,
    Success,
    FailureMessage,
    Bytes,
    SentBytes,
    GrpThreads,
    AllThreads,
    Url,
    Latency,
    IdleTime,
    Connect,
}

impl JtlColumn {
    pub const ALL: [JtlColumn; 17] = [
        JtlColumn::TimeStamp,
        JtlColumn::Elapsed,
        JtlColumn::Label,
        JtlColumn::ResponseCode,
        JtlColumn::ResponseMessage,
        JtlColumn::ThreadName,
        JtlColumn::DataType,
        JtlColumn::Success,
        JtlColumn::FailureMessage,
        JtlColumn::Bytes,
        JtlColumn::SentBytes,
        JtlColumn::GrpThreads,
        JtlColumn::AllThreads,
        JtlColumn::Url,
        JtlColumn::Latency,
        JtlColumn::IdleTime,
        JtlColumn::Connect,
    ];

    /// The exact header name JMeter writes for this column.
    pub fn header_name(self) -> &'static str {
        match self {
            JtlColumn::TimeStamp => "timeStamp",
            JtlColumn::Elapsed => "elapsed",
            JtlColumn::Label => "label",
            JtlColumn::ResponseCode => "responseCode",
            JtlColumn::ResponseMessage => "responseMessage",
            JtlColumn::ThreadName => "threadName",
            JtlColumn::DataType => "dataType",
            JtlColumn::Success => "success",
            JtlColumn::FailureMessage => "failureMessage",
            JtlColumn::Bytes => "bytes",
            JtlColumn::SentBytes => "sentBytes",
            JtlColumn::GrpThreads => "grpThreads",
            JtlColumn::AllThreads => "allThreads",
            JtlColumn::Url => "URL",
            JtlColumn::Latency => "Latency",
            JtlColumn::IdleTime => "IdleTime",
            JtlColumn::Connect => "Connect",
        }
    }

    /// Header names are matched exactly, as JMeter writes them.
    pub fn from_header(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.header_name() == name)
    }
}

impl std::fmt::Display for JtlColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.header_name())
    }
}

/// Position of every known column within one file's header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnLayout {
    indices: Vec<(JtlColumn, usize)>,
}

impl ColumnLayout {
    /// Build a layout from the cells of a header row. Unknown cells are
    /// ignored; the first occurrence of a duplicated column wins.
    pub fn from_header<S: AsRef<str>>(cells: &[S]) -> Self {
        let mut indices: Vec<(JtlColumn, usize)> = Vec::new();
        for (idx, cell) in cells.iter().enumerate() {
            if let Some(column) = JtlColumn::from_header(cell.as_ref().trim()) {
                if !indices.iter().any(|(c, _)| *c == column) {
                    indices.push((column, idx));
                }
            }
        }
        Self { indices }
    }

    pub fn contains(&self, column: JtlColumn) -> bool {
        self.indices.iter().any(|(c, _)| *c == column)
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Present columns with their positions, in header order.
    pub fn columns(&self) -> impl Iterator<Item = (JtlColumn, usize)> + '_ {
        self.indices.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_names_round_trip() {
        for column in JtlColumn::ALL {
            assert_eq!(JtlColumn::from_header(column.header_name()), Some(column));
        }
    }

    #[test]
    fn header_match_is_case_sensitive() {
        assert_eq!(JtlColumn::from_header("url"), None);
        assert_eq!(JtlColumn::from_header("URL"), Some(JtlColumn::Url));
        assert_eq!(JtlColumn::from_header("timestamp"), None);
    }

    #[test]
    fn layout_records_positions() {
        let layout = ColumnLayout::from_header(&["timeStamp", "elapsed", "label", "success"]);
        let positions: Vec<_> = layout.columns().collect();
        assert_eq!(
            positions,
            vec![
                (JtlColumn::TimeStamp, 0),
                (JtlColumn::Elapsed, 1),
                (JtlColumn::Label, 2),
                (JtlColumn::Success, 3),
            ]
        );
        assert!(!layout.contains(JtlColumn::Bytes));
    }

    #[test]
    fn layout_ignores_unknown_cells_and_trims() {
        let layout = ColumnLayout::from_header(&["custom", " elapsed ", "label\r"]);
        let positions: Vec<_> = layout.columns().collect();
        assert_eq!(positions, vec![(JtlColumn::Elapsed, 1), (JtlColumn::Label, 2)]);
    }

    #[test]
    fn layout_keeps_first_of_duplicated_columns() {
        let layout = ColumnLayout::from_header(&["label", "elapsed", "label"]);
        let positions: Vec<_> = layout.columns().collect();
        assert_eq!(positions, vec![(JtlColumn::Label, 0), (JtlColumn::Elapsed, 1)]);
        assert!(layout.contains(JtlColumn::Label));
    }

    #[test]
    fn layout_without_known_columns_is_empty() {
        let layout = ColumnLayout::from_header(&["a", "b", "c"]);
        assert!(layout.is_empty());
    }
}
