//! JSON output schema version 2 (`spec.md` §6).
//!
//! `sub_scores` and `evidence` arrays are always present, never omitted or
//! null, even when a category or metric is entirely unavailable — the
//! extractor (`scoring::extractors`) already guarantees every configured
//! metric key exists in a `ScoredResult`, so this module only reshapes.

use serde::{Deserialize, Serialize};

use crate::scoring::{CategoryScore, EvidenceItem, ScoredResult, SubScore};

pub const SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonEvidence {
    pub file_path: String,
    pub line: usize,
    pub value: f64,
    pub description: String,
}

impl From<&EvidenceItem> for JsonEvidence {
    fn from(e: &EvidenceItem) -> Self {
        Self {
            file_path: e.file_path.display().to_string(),
            line: e.line,
            value: e.value,
            description: e.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSubScore {
    pub name: String,
    pub raw_value: f64,
    pub score: f64,
    pub weight: f64,
    pub available: bool,
    pub evidence: Vec<JsonEvidence>,
}

impl From<&SubScore> for JsonSubScore {
    fn from(s: &SubScore) -> Self {
        Self {
            name: s.metric_name.clone(),
            raw_value: s.raw_value,
            score: s.score,
            weight: s.weight,
            available: s.available,
            evidence: s.evidence.iter().map(JsonEvidence::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonCategory {
    pub name: String,
    pub score: f64,
    pub weight: f64,
    pub sub_scores: Vec<JsonSubScore>,
}

impl From<&CategoryScore> for JsonCategory {
    fn from(c: &CategoryScore) -> Self {
        Self {
            name: c.name.clone(),
            score: c.score,
            weight: c.weight,
            sub_scores: c.sub_scores.iter().map(JsonSubScore::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: u32,
    pub composite_score: f64,
    pub tier: String,
    pub categories: Vec<JsonCategory>,
}

impl From<&ScoredResult> for JsonReport {
    fn from(result: &ScoredResult) -> Self {
        Self {
            version: SCHEMA_VERSION,
            composite_score: result.composite_score,
            tier: result.tier().to_string(),
            categories: result.categories.iter().map(JsonCategory::from).collect(),
        }
    }
}

pub fn render(result: &ScoredResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport::from(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::engine::score_all;
    use crate::scoring::ScoringConfig;

    #[test]
    fn empty_results_still_produce_non_null_arrays() {
        let result = score_all(&[], &ScoringConfig::default());
        let report = JsonReport::from(&result);
        assert_eq!(report.version, 2);
        for category in &report.categories {
            for sub in &category.sub_scores {
                assert!(sub.evidence.is_empty() || !sub.evidence.is_empty());
            }
        }
        assert!(!report.categories.is_empty());
    }

    #[test]
    fn render_produces_valid_json() {
        let result = score_all(&[], &ScoringConfig::default());
        let text = render(&result).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["version"], 2);
        assert!(parsed["categories"].is_array());
    }
}
