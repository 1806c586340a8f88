use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::JtlError;
use crate::jtl::JtlRecord;

// ---------------------------------------------------------------------------
// ApdexThresholds
// ---------------------------------------------------------------------------

/// Response-time cutoffs (ms) separating satisfied, tolerated and frustrated
/// samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApdexThresholds {
    pub toleration: u64,
    pub frustration: u64,
}

impl Default for ApdexThresholds {
    fn default() -> Self {
        Self {
            toleration: 500,
            frustration: 1500,
        }
    }
}

impl ApdexThresholds {
    /// Build a threshold pair, rejecting `toleration == 0` and
    /// `frustration <= toleration`.
    pub fn new(toleration: u64, frustration: u64) -> Result<Self, JtlError> {
        let thresholds = Self {
            toleration,
            frustration,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<(), JtlError> {
        if self.toleration == 0 {
            return Err(JtlError::Validation(
                "APDEX toleration threshold must be greater than 0".to_string(),
            ));
        }
        if self.frustration <= self.toleration {
            return Err(JtlError::Validation(format!(
                "APDEX frustration threshold ({}) must be greater than toleration ({})",
                self.frustration, self.toleration
            )));
        }
        Ok(())
    }

    pub fn classify(&self, elapsed_ms: u64) -> ApdexZone {
        if elapsed_ms <= self.toleration {
            ApdexZone::Satisfied
        } else if elapsed_ms <= self.frustration {
            ApdexZone::Tolerated
        } else {
            ApdexZone::Frustrated
        }
    }
}

/// Which band a single successful sample falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApdexZone {
    Satisfied,
    Tolerated,
    Frustrated,
}

// ---------------------------------------------------------------------------
// ApdexRating
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApdexRating {
    Excellent,
    Good,
    Fair,
    Poor,
    Unacceptable,
}

impl ApdexRating {
    /// Band a score. Each band includes its lower bound.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.94 {
            ApdexRating::Excellent
        } else if score >= 0.85 {
            ApdexRating::Good
        } else if score >= 0.70 {
            ApdexRating::Fair
        } else if score >= 0.50 {
            ApdexRating::Poor
        } else {
            ApdexRating::Unacceptable
        }
    }
}

impl std::fmt::Display for ApdexRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ApdexRating::Excellent => "Excellent",
            ApdexRating::Good => "Good",
            ApdexRating::Fair => "Fair",
            ApdexRating::Poor => "Poor",
            ApdexRating::Unacceptable => "Unacceptable",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// ApdexResult
// ---------------------------------------------------------------------------

/// APDEX outcome of one label, computed over its successful samples only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApdexResult {
    pub satisfied: u64,
    pub tolerated: u64,
    pub frustrated: u64,
    pub score: f64,
    pub rating: ApdexRating,
}

impl ApdexResult {
    fn from_counts(satisfied: u64, tolerated: u64, frustrated: u64) -> Self {
        let total = satisfied + tolerated + frustrated;
        // A label whose samples all failed scores 0 instead of 0/0.
        let score = if total == 0 {
            0.0
        } else {
            (satisfied as f64 + tolerated as f64 / 2.0) / total as f64
        };
        Self {
            satisfied,
            tolerated,
            frustrated,
            score,
            rating: ApdexRating::from_score(score),
        }
    }

    pub fn total(&self) -> u64 {
        self.satisfied + self.tolerated + self.frustrated
    }
}

/// Score every label of a file.
///
/// Every label seen in `records` gets an entry, including labels with no
/// successful sample (those score 0 / `Unacceptable`).
pub fn score_apdex(
    records: &[JtlRecord],
    thresholds: &ApdexThresholds,
) -> BTreeMap<String, ApdexResult> {
    let mut counts: BTreeMap<&str, [u64; 3]> = BTreeMap::new();

    for record in records {
        let entry = counts.entry(record.label()).or_default();
        if !record.is_success() {
            continue;
        }
        match thresholds.classify(record.elapsed_ms()) {
            ApdexZone::Satisfied => entry[0] += 1,
            ApdexZone::Tolerated => entry[1] += 1,
            ApdexZone::Frustrated => entry[2] += 1,
        }
    }

    counts
        .into_iter()
        .map(|(label, [s, t, f])| (label.to_string(), ApdexResult::from_counts(s, t, f)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
