//! Scoring engine: extracts `(raw, evidence)` per metric from each
//! category's `CategoryMetrics`, interpolates through the metric's
//! breakpoint table, and weight-combines into category and composite
//! scores (`spec.md` §4.5).

pub mod breakpoints;
pub mod config;
pub mod engine;
pub mod extractors;

pub use breakpoints::{current_band_index, direction, interpolate, Breakpoint, Direction};
pub use config::{CategoryConfig, MetricConfig, ScoringConfig};
pub use engine::score_all;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub file_path: PathBuf,
    pub line: usize,
    pub value: f64,
    pub description: String,
}

/// Per-metric scored record (`spec.md` §3 `SubScore`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubScore {
    pub metric_name: String,
    pub raw_value: f64,
    pub score: f64,
    pub weight: f64,
    pub available: bool,
    /// Always present, possibly empty — never omitted.
    pub evidence: Vec<EvidenceItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScore {
    pub name: String,
    pub score: f64,
    pub weight: f64,
    pub sub_scores: Vec<SubScore>,
}

impl CategoryScore {
    pub fn has_available_metric(&self) -> bool {
        self.sub_scores.iter().any(|s| s.available && s.weight > 0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredResult {
    pub composite_score: f64,
    pub categories: Vec<CategoryScore>,
}

impl ScoredResult {
    pub fn tier(&self) -> &'static str {
        match self.composite_score {
            s if s >= 8.5 => "excellent",
            s if s >= 7.0 => "good",
            s if s >= 5.0 => "fair",
            s if s >= 3.0 => "poor",
            _ => "critical",
        }
    }

    pub fn category(&self, name: &str) -> Option<&CategoryScore> {
        self.categories.iter().find(|c| c.name == name)
    }
}
