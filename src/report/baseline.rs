//! Baseline report loading (`spec.md` §4.6, §6).
//!
//! A baseline is this system's own JSON output from a prior run, read back
//! in to compute score deltas. Only top-level category identity and score
//! are read; older baselines that used the field name `metrics` instead of
//! `sub_scores` are accepted via `serde(alias)`, and a baseline missing
//! sub-scores entirely still loads — deltas are then computed at the
//! category level only.

use serde::Deserialize;

use crate::errors::AgentReadinessError;

#[derive(Debug, Clone, Deserialize)]
pub struct BaselineSubScore {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BaselineCategory {
    pub name: String,
    pub score: f64,
    #[serde(default, alias = "metrics")]
    pub sub_scores: Vec<BaselineSubScore>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BaselineReport {
    pub composite_score: f64,
    #[serde(default)]
    pub categories: Vec<BaselineCategory>,
}

impl BaselineReport {
    pub fn category(&self, name: &str) -> Option<&BaselineCategory> {
        self.categories.iter().find(|c| c.name == name)
    }
}

pub fn load(text: &str) -> Result<BaselineReport, AgentReadinessError> {
    serde_json::from_str(text)
        .map_err(|e| AgentReadinessError::config(format!("malformed baseline report: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_current_schema() {
        let text = r#"{
            "version": 2, "composite_score": 7.5, "tier": "good",
            "categories": [{"name": "Code Health", "score": 8.0, "weight": 0.2,
                "sub_scores": [{"name": "avg_cyclomatic_complexity", "raw_value": 4.0,
                    "score": 8.0, "weight": 0.25, "available": true, "evidence": []}]}]
        }"#;
        let baseline = load(text).unwrap();
        assert_eq!(baseline.composite_score, 7.5);
        let c1 = baseline.category("Code Health").unwrap();
        assert_eq!(c1.sub_scores.len(), 1);
        assert_eq!(c1.sub_scores[0].name, "avg_cyclomatic_complexity");
    }

    #[test]
    fn loads_older_schema_with_metrics_key_and_no_subscores() {
        let text = r#"{
            "composite_score": 6.0,
            "categories": [{"name": "Testing", "score": 5.0}]
        }"#;
        let baseline = load(text).unwrap();
        assert_eq!(baseline.composite_score, 6.0);
        let testing = baseline.category("Testing").unwrap();
        assert!(testing.sub_scores.is_empty());
    }

    #[test]
    fn loads_older_schema_with_metrics_aliased_field() {
        let text = r#"{
            "composite_score": 6.0,
            "categories": [{"name": "Testing", "score": 5.0,
                "metrics": [{"name": "coverage_pct", "score": 4.0}]}]
        }"#;
        let baseline = load(text).unwrap();
        let testing = baseline.category("Testing").unwrap();
        assert_eq!(testing.sub_scores[0].name, "coverage_pct");
    }

    #[test]
    fn malformed_json_is_a_parse_error_not_a_panic() {
        assert!(load("not json").is_err());
    }
}
