use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::ApdexThresholds;
use crate::compare::{ComparisonMetric, ComparisonOptions, DiffMode};
use crate::error::JtlError;
use crate::history::{FileHistory, DEFAULT_MAX_ENTRIES};

// ---------------------------------------------------------------------------
// Settings document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct ComparisonSettings {
    pub diff_mode: DiffMode,
    /// Percent change below which a metric is reported as unchanged.
    pub significance_threshold: f64,
    pub metrics: Vec<ComparisonMetric>,
}

impl Default for ComparisonSettings {
    fn default() -> Self {
        Self {
            diff_mode: DiffMode::Hybrid,
            significance_threshold: 5.0,
            metrics: ComparisonMetric::DEFAULT.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct HistorySettings {
    pub max_entries: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

/// User preferences persisted as JSON. Every field is optional in the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Settings {
    pub apdex: ApdexThresholds,
    pub comparison: ComparisonSettings,
    pub history: HistorySettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), JtlError> {
        self.apdex.validate()?;

        let threshold = self.comparison.significance_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(JtlError::Validation(format!(
                "significance threshold must be a non-negative number, got {threshold}"
            )));
        }
        if self.comparison.metrics.is_empty() {
            return Err(JtlError::Validation(
                "at least one comparison metric is required".to_string(),
            ));
        }
        if self.history.max_entries == 0 {
            return Err(JtlError::Validation(
                "history size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn comparison_options(&self) -> ComparisonOptions {
        ComparisonOptions {
            metrics: self.comparison.metrics.clone(),
            significance_threshold: self.comparison.significance_threshold,
        }
    }

    pub fn new_history(&self) -> FileHistory {
        FileHistory::new(self.history.max_entries)
    }

    /// Read and validate a settings file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, JtlError> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, JtlError> {
        match Self::load(path.as_ref()).await {
            Err(JtlError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.as_ref().display(), "no settings file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Write the settings as pretty-printed JSON, creating parent
    /// directories as needed.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), JtlError> {
        self.validate()?;
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
