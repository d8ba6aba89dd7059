//! Ties per-category extractors to the breakpoint tables and produces the
//! final `ScoredResult` (`spec.md` §4.5).

use crate::metrics::{AnalysisResult, Category};
use crate::scoring::{
    config::{CategoryConfig, ScoringConfig},
    extractors,
    interpolate, CategoryScore, EvidenceItem, ScoredResult, SubScore,
};
use std::collections::HashMap;

pub type RawValues = HashMap<String, f64>;
pub type Unavailable = HashMap<String, bool>;
pub type EvidenceMap = HashMap<String, Vec<EvidenceItem>>;

/// Extracted `(raw, unavailable, evidence)` triple for one category, as
/// produced by `extractors::extract`. Every configured metric key for the
/// category must appear in all three maps (`spec.md` §8 invariant 4).
pub struct Extraction {
    pub raw: RawValues,
    pub unavailable: Unavailable,
    pub evidence: EvidenceMap,
}

/// Score every category in `config` against the matching `AnalysisResult`
/// (by `Category`), then weight-combine into a composite score. A category
/// with no corresponding result (the analyzer was never run, e.g. C5/C7
/// skipped by environment) is scored exactly as if every metric were
/// unavailable.
pub fn score_all(results: &[AnalysisResult], config: &ScoringConfig) -> ScoredResult {
    let categories: Vec<CategoryScore> = config
        .categories
        .iter()
        .map(|cat_config| {
            let result = results.iter().find(|r| r.category == cat_config.category);
            match result {
                Some(r) => score_category(cat_config, &extractors::extract(&r.metrics)),
                None => unavailable_category(cat_config),
            }
        })
        .collect();

    let numerator: f64 = categories
        .iter()
        .filter(|c| c.has_available_metric())
        .map(|c| c.score * c.weight)
        .sum();
    let denominator: f64 = categories
        .iter()
        .filter(|c| c.has_available_metric())
        .map(|c| c.weight)
        .sum();
    let composite_score = if denominator > 0.0 {
        (numerator / denominator).clamp(1.0, 10.0)
    } else {
        0.0
    };

    ScoredResult {
        composite_score,
        categories,
    }
}

fn score_category(cat_config: &CategoryConfig, extraction: &Extraction) -> CategoryScore {
    let sub_scores: Vec<SubScore> = cat_config
        .metrics
        .iter()
        .map(|metric_cfg| {
            let is_unavailable = extraction
                .unavailable
                .get(&metric_cfg.name)
                .copied()
                .unwrap_or(true);
            let raw_value = extraction.raw.get(&metric_cfg.name).copied().unwrap_or(0.0);
            let evidence = extraction
                .evidence
                .get(&metric_cfg.name)
                .cloned()
                .unwrap_or_default();
            let score = if is_unavailable {
                0.0
            } else {
                interpolate(&metric_cfg.breakpoints, raw_value)
            };
            SubScore {
                metric_name: metric_cfg.name.clone(),
                raw_value,
                score,
                weight: metric_cfg.weight,
                available: !is_unavailable,
                evidence,
            }
        })
        .collect();

    let numerator: f64 = sub_scores
        .iter()
        .filter(|s| s.available && s.weight > 0.0)
        .map(|s| s.score * s.weight)
        .sum();
    let denominator: f64 = sub_scores
        .iter()
        .filter(|s| s.available && s.weight > 0.0)
        .map(|s| s.weight)
        .sum();
    let score = if denominator > 0.0 {
        (numerator / denominator).clamp(1.0, 10.0)
    } else {
        0.0
    };

    CategoryScore {
        name: cat_config.category.display_name().to_string(),
        score,
        weight: cat_config.weight,
        sub_scores,
    }
}

fn unavailable_category(cat_config: &CategoryConfig) -> CategoryScore {
    let sub_scores = cat_config
        .metrics
        .iter()
        .map(|m| SubScore {
            metric_name: m.name.clone(),
            raw_value: 0.0,
            score: 0.0,
            weight: m.weight,
            available: false,
            evidence: Vec::new(),
        })
        .collect();
    CategoryScore {
        name: cat_config.category.display_name().to_string(),
        score: 0.0,
        weight: cat_config.weight,
        sub_scores,
    }
}

/// Every configured category is represented in `Category::ALL`; used by
/// discovery/report code that needs the full set independent of which
/// analyzers actually ran.
pub fn all_categories() -> &'static [Category] {
    &Category::ALL
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{C5Metrics, CategoryMetrics};

    #[test]
    fn missing_analyzer_result_marks_every_metric_unavailable() {
        let config = ScoringConfig::default();
        let scored = score_all(&[], &config);
        for cat in &scored.categories {
            assert_eq!(cat.score, 0.0);
            assert!(cat.sub_scores.iter().all(|s| !s.available));
        }
        assert_eq!(scored.composite_score, 0.0);
    }

    #[test]
    fn c5_unavailable_excludes_category_from_composite() {
        let config = ScoringConfig::default();
        let result = AnalysisResult {
            category: Category::C5TemporalDynamics,
            metrics: CategoryMetrics::C5(C5Metrics {
                available: false,
                ..Default::default()
            }),
        };
        let scored = score_all(&[result], &config);
        let c5 = scored
            .categories
            .iter()
            .find(|c| c.name == Category::C5TemporalDynamics.display_name())
            .unwrap();
        assert_eq!(c5.score, 0.0);
        assert!(!c5.has_available_metric());
    }
}
