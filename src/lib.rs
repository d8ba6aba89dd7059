//! Agent readiness analyzer: scores a repository across seven categories
//! (code health, semantic explicitness, architecture, documentation,
//! temporal dynamics, testing, and agent evaluation) and assembles
//! JSON/HTML reports. Generalized from a polyglot, `syn` + tree-sitter
//! powered code-quality analyzer into a single-purpose readiness scorer.

pub mod agent;
pub mod analyzers;
pub mod complexity;
pub mod config;
pub mod core;
pub mod coverage;
pub mod errors;
pub mod git;
pub mod metrics;
pub mod observability;
pub mod parser;
pub mod report;
pub mod scoring;

use std::path::Path;

use core::{AnalysisTarget, Language};
use metrics::{AnalysisResult, CategoryMetrics};
use scoring::{ScoredResult, ScoringConfig};

/// Everything one `analyze` run needs beyond the discovered targets
/// themselves.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub scoring: ScoringConfig,
    pub agent: agent::AgentConfig,
    /// Skips C7 entirely — the pipeline still runs C1-C6 and C5, and the
    /// scoring engine excludes Agent Evaluation from the composite the
    /// same way it would if the agent binary were simply unreachable.
    pub skip_agent: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            agent: agent::AgentConfig::default(),
            skip_agent: false,
        }
    }
}

/// Full pipeline output: every analyzer's raw result (used by report
/// assembly for C7 trace rendering) plus the final scored/weighted result.
pub struct PipelineOutput {
    pub raw_results: Vec<AnalysisResult>,
    pub scored: ScoredResult,
}

/// Runs the full seven-category pipeline against `targets` rooted at
/// `root_dir`: C1/C2/C3/C4/C6 sequentially, coverage merged into C6 if a
/// report file is present, C5 git history, then C7 agent evaluation
/// unless skipped — followed by scoring (`spec.md` §2, §5).
pub async fn analyze(targets: &[AnalysisTarget], root_dir: &Path, config: &RunConfig) -> PipelineOutput {
    let mut results = analyzers::run_all(targets);

    if let Some(coverage_report) = coverage::discover_and_parse(root_dir) {
        for result in &mut results {
            if let CategoryMetrics::C6(c6) = &mut result.metrics {
                coverage::merge_into(c6, &coverage_report);
            }
        }
    }

    results.push(git::analyze(root_dir));

    if !config.skip_agent {
        let c7 = agent::analyze(targets, &results, &config.agent).await;
        results.push(c7);
    }

    let scored = scoring::score_all(&results, &config.scoring);
    PipelineOutput {
        raw_results: results,
        scored,
    }
}

/// The distinct languages represented across `targets`, in discovery
/// order — used by report assembly for improvement-prompt build-command
/// defaults.
pub fn languages_of(targets: &[AnalysisTarget]) -> Vec<Language> {
    let mut seen = Vec::new();
    for target in targets {
        if !seen.contains(&target.language) {
            seen.push(target.language);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn analyze_on_an_empty_target_list_produces_a_composite_score() {
        let config = RunConfig {
            skip_agent: true,
            ..RunConfig::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let output = analyze(&[], dir.path(), &config).await;
        assert!(output.scored.composite_score >= 0.0);
        assert!(!output.raw_results.is_empty());
    }

    #[test]
    fn languages_of_dedupes_in_discovery_order() {
        let targets = vec![
            AnalysisTarget {
                language: Language::Rust,
                root_dir: "a".into(),
                files: Vec::new(),
            },
            AnalysisTarget {
                language: Language::Python,
                root_dir: "b".into(),
                files: Vec::new(),
            },
            AnalysisTarget {
                language: Language::Rust,
                root_dir: "c".into(),
                files: Vec::new(),
            },
        ];
        assert_eq!(languages_of(&targets), vec![Language::Rust, Language::Python]);
    }
}
