use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::JtlError;
use crate::processor::ProcessedResult;
use crate::upload::ProcessedFile;

/// Default number of files kept before the oldest is evicted.
pub const DEFAULT_MAX_ENTRIES: usize = 50;

// ---------------------------------------------------------------------------
// StoredFile
// ---------------------------------------------------------------------------

/// A processed file as kept in the history. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub id: Uuid,
    pub name: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    pub result: ProcessedResult,
}

// ---------------------------------------------------------------------------
// HistoryEntry: lightweight list entry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub name: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    pub jmeter_version: String,
    pub total_samples: u64,
    pub avg_response_time: f64,
    pub error_percentage: f64,
    pub throughput: f64,
}

impl HistoryEntry {
    pub fn from_stored(file: &StoredFile) -> Self {
        let s = &file.result.statistics;
        Self {
            id: file.id,
            name: file.name.clone(),
            size_bytes: file.size_bytes,
            uploaded_at: file.uploaded_at,
            jmeter_version: file.result.jmeter_version_or_unknown().to_string(),
            total_samples: s.total_samples,
            avg_response_time: s.avg_response_time,
            error_percentage: s.error_percentage,
            throughput: s.throughput,
        }
    }
}

// ---------------------------------------------------------------------------
// FileHistory
// ---------------------------------------------------------------------------

/// In-memory arena of processed files, addressed by id.
/// Holds the last `max_entries` files in insertion order.
#[derive(Debug, Clone)]
pub struct FileHistory {
    files: VecDeque<StoredFile>,
    max_entries: usize,
}

impl Default for FileHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl FileHistory {
    /// A capacity of 0 is raised to 1.
    pub fn new(max_entries: usize) -> Self {
        Self {
            files: VecDeque::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Store a processed file, evicting the oldest if the history is full.
    /// Returns the id assigned to the new entry.
    pub fn add(&mut self, file: ProcessedFile) -> Uuid {
        while self.files.len() >= self.max_entries {
            if let Some(evicted) = self.files.pop_front() {
                tracing::debug!(id = %evicted.id, name = %evicted.name, "evicted oldest history entry");
            }
        }

        let id = Uuid::new_v4();
        self.files.push_back(StoredFile {
            id,
            name: file.name,
            size_bytes: file.size_bytes,
            uploaded_at: Utc::now(),
            result: file.result,
        });
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<&StoredFile> {
        self.files.iter().find(|f| f.id == *id)
    }

    /// Like [`get`](Self::get) but reports a missing id as an error.
    pub fn require(&self, id: &Uuid) -> Result<&StoredFile, JtlError> {
        self.get(id)
            .ok_or_else(|| JtlError::NotFound(format!("history entry {id}")))
    }

    pub fn remove(&mut self, id: &Uuid) -> Result<StoredFile, JtlError> {
        let index = self
            .files
            .iter()
            .position(|f| f.id == *id)
            .ok_or_else(|| JtlError::NotFound(format!("history entry {id}")))?;
        self.files
            .remove(index)
            .ok_or_else(|| JtlError::Internal(format!("history index {index} out of range")))
    }

    /// Summaries of every stored file, oldest first.
    pub fn list(&self) -> Vec<HistoryEntry> {
        self.files.iter().map(HistoryEntry::from_stored).collect()
    }

    /// Entries whose name contains `query`, ignoring case. An empty query
    /// matches everything.
    pub fn search(&self, query: &str) -> Vec<HistoryEntry> {
        let needle = query.trim().to_lowercase();
        self.files
            .iter()
            .filter(|f| f.name.to_lowercase().contains(&needle))
            .map(HistoryEntry::from_stored)
            .collect()
    }

    pub fn clear(&mut self) {
        self.files.clear();
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

    fn make_file(name: &str) -> ProcessedFile {
        let raw = "# Apache JMeter 5.6\ntimeStamp,elapsed,label,success\n0,100,a,true\n2000,300,a,false\n";
        ProcessedFile {
            name: name.to_string(),
            size_bytes: raw.len() as u64,
            result: process_jtl(raw, &ApdexThresholds::default())
                .expect("processing should succeed"),
        }
    }

    #[test]
    fn add_then_get() {
        let mut history = FileHistory::default();
        let id = history.add(make_file("baseline.jtl"));
        let stored = history.get(&id).expect("entry should exist");
        assert_eq!(stored.name, "baseline.jtl");
        assert_eq!(stored.result.statistics.total_samples, 2);
    }

    #[test]
    fn ids_are_unique() {
        let mut history = FileHistory::default();
        let a = history.add(make_file("a.jtl"));
        let b = history.add(make_file("a.jtl"));
        assert_ne!(a, b);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn oldest_is_evicted_at_capacity() {
        let mut history = FileHistory::new(2);
        let first = history.add(make_file("one.jtl"));
        history.add(make_file("two.jtl"));
        history.add(make_file("three.jtl"));

        assert_eq!(history.len(), 2);
        assert!(history.get(&first).is_none());
        let names: Vec<_> = history.list().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["two.jtl", "three.jtl"]);
    }

    #[test]
    fn zero_capacity_keeps_one() {
        let mut history = FileHistory::new(0);
        history.add(make_file("a.jtl"));
        history.add(make_file("b.jtl"));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn remove_returns_entry_and_missing_is_not_found() {
        let mut history = FileHistory::default();
        let id = history.add(make_file("a.jtl"));
        let removed = history.remove(&id).expect("remove should succeed");
        assert_eq!(removed.name, "a.jtl");
        assert!(history.is_empty());
        assert!(matches!(history.remove(&id), Err(JtlError::NotFound(_))));
        assert!(matches!(history.require(&id), Err(JtlError::NotFound(_))));
    }

    #[test]
    fn list_summarises_entries() {
        let mut history = FileHistory::default();
        history.add(make_file("run.jtl"));
        let entries = history.list();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.jmeter_version, "JMeter 5.6");
        assert_eq!(entry.total_samples, 2);
        assert_eq!(entry.avg_response_time, 200.0);
        assert_eq!(entry.error_percentage, 50.0);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let mut history = FileHistory::default();
        history.add(make_file("Release-1.2.jtl"));
        history.add(make_file("nightly.csv"));
        let hits = history.search("release");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Release-1.2.jtl");
        assert_eq!(history.search("").len(), 2);
        assert!(history.search("missing").is_empty());
    }

    #[test]
    fn clear_empties_history() {
        let mut history = FileHistory::default();
        history.add(make_file("a.jtl"));
        history.clear();
        assert!(history.is_empty());
        assert!(history.list().is_empty());
    }

    #[test]
    fn entry_serializes_camel_case() {
        let mut history = FileHistory::default();
        history.add(make_file("a.jtl"));
        let json = serde_json::to_value(&history.list()[0]).expect("serialize should succeed");
        assert!(json.get("uploadedAt").is_some());
        assert!(json.get("sizeBytes").is_some());
        assert_eq!(json["jmeterVersion"], "JMeter 5.6");
    }
}
