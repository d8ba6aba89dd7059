//! `CategoryMetrics`: the closed sum type produced by the seven category
//! analyzers. Each variant is a record of named aggregates plus the detail
//! slices the evidence pipeline (`evidence`) and scoring extractors
//! (`scoring::extractors`) read back out.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

// ---------------------------------------------------------------------
// C1 Code Health
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionComplexity {
    pub file: PathBuf,
    pub function: String,
    pub line: usize,
    pub cyclomatic: u32,
    pub length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSizeRecord {
    pub file: PathBuf,
    pub lines: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateBlock {
    pub hash: u64,
    /// (file, start_line) occurrences of this structural duplicate, sorted
    /// by file path then line for deterministic tie-breaking.
    pub occurrences: Vec<(PathBuf, usize)>,
    pub statement_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct C1Metrics {
    pub avg_cyclomatic_complexity: f64,
    pub max_cyclomatic_complexity: u32,
    pub avg_function_length: f64,
    pub max_function_length: usize,
    pub avg_file_size: f64,
    /// Keyed by an in-module package path; values are the number of
    /// modules importing (afferent) and imported-by (efferent) it.
    pub afferent_coupling: HashMap<String, u32>,
    pub efferent_coupling: HashMap<String, u32>,
    pub duplication_rate: f64,
    pub functions: Vec<FunctionComplexity>,
    pub file_sizes: Vec<FileSizeRecord>,
    pub duplicate_blocks: Vec<DuplicateBlock>,
}

// ---------------------------------------------------------------------
// C2 Semantic Explicitness
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagicNumberOccurrence {
    pub file: PathBuf,
    pub line: usize,
    pub literal: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingViolation {
    pub file: PathBuf,
    pub line: usize,
    pub identifier: String,
    pub expected_convention: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerLanguageSemantics {
    pub language: crate::core::Language,
    pub loc: usize,
    pub type_annotation_coverage: f64,
    pub naming_consistency: f64,
    pub naming_violations: Vec<NamingViolation>,
    pub magic_number_ratio_per_kloc: f64,
    pub magic_number_count: usize,
    pub magic_numbers: Vec<MagicNumberOccurrence>,
    pub type_strictness: bool,
    pub null_safety_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct C2Metrics {
    pub per_language: Vec<PerLanguageSemantics>,
    /// LOC-weighted aggregates across all languages present.
    pub aggregate_type_annotation_coverage: f64,
    pub aggregate_naming_consistency: f64,
    pub aggregate_magic_number_ratio_per_kloc: f64,
    pub aggregate_null_safety_score: f64,
    pub any_type_strictness: bool,
}

// ---------------------------------------------------------------------
// C3 Architecture
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadExport {
    pub file: PathBuf,
    pub line: usize,
    pub symbol: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct C3Metrics {
    pub max_directory_depth: usize,
    pub avg_module_fanout: f64,
    /// Each entry is a minimal cyclic path of module identifiers
    /// (lexicographically-least rotation).
    pub circular_dependencies: Vec<Vec<String>>,
    pub import_complexity: f64,
    pub dead_exports: Vec<DeadExport>,
}

// ---------------------------------------------------------------------
// C4 Documentation
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct C4Metrics {
    pub readme_word_count: usize,
    pub comment_density: f64,
    pub api_doc_coverage: f64,
    pub has_changelog: bool,
    pub has_examples: bool,
    pub has_contributing: bool,
    pub has_diagrams: bool,
    /// Public items lacking a doc comment, worst (largest/most-used) first.
    pub undocumented_public_items: Vec<DeadExport>,
}

// ---------------------------------------------------------------------
// C5 Temporal Dynamics
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoupledPair {
    pub file_a: PathBuf,
    pub file_b: PathBuf,
    pub shared_commits: u32,
    pub coupling_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotspot {
    pub file: PathBuf,
    pub changes: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct C5Metrics {
    pub available: bool,
    pub total_commits: u32,
    pub churn_rate: f64,
    pub temporal_coupling_pct: f64,
    pub coupled_pairs: Vec<CoupledPair>,
    pub author_fragmentation: f64,
    pub commit_stability_days: f64,
    pub hotspot_concentration: f64,
    pub top_hotspots: Vec<Hotspot>,
}

// ---------------------------------------------------------------------
// C6 Testing
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestFunctionRecord {
    pub file: PathBuf,
    pub name: String,
    pub line: usize,
    pub assertion_count: usize,
    pub is_isolated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverageSource {
    GoCover,
    Lcov,
    Cobertura,
    None,
}

impl Default for CoverageSource {
    fn default() -> Self {
        CoverageSource::None
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct C6Metrics {
    pub test_to_code_ratio: f64,
    pub coverage_pct: Option<f64>,
    pub coverage_source: Option<CoverageSource>,
    pub test_isolation_pct: f64,
    pub avg_assertion_density: f64,
    pub test_file_count: usize,
    pub source_file_count: usize,
    pub tests: Vec<TestFunctionRecord>,
}

// ---------------------------------------------------------------------
// C7 Agent Evaluation
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreIndicator {
    pub name: String,
    pub matched: bool,
    pub delta: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreTrace {
    pub base_score: i32,
    pub indicators: Vec<ScoreIndicator>,
    pub final_score: i32,
}

impl ScoreTrace {
    /// Build a trace from a base score and the indicator list, computing
    /// `final_score` by construction so it can never disagree with the sum
    /// of matched deltas (`spec.md` §3 invariant on `ScoreTrace`).
    pub fn new(base_score: i32, indicators: Vec<ScoreIndicator>) -> Self {
        let sum: i32 = indicators
            .iter()
            .map(|i| if i.matched { i.delta } else { 0 })
            .sum();
        let final_score = (base_score + sum).clamp(1, 10);
        // Zero out deltas on unmatched indicators so the stored trace
        // itself always satisfies `Delta == 0 whenever Matched == false`.
        let indicators = indicators
            .into_iter()
            .map(|mut i| {
                if !i.matched {
                    i.delta = 0;
                }
                i
            })
            .collect();
        Self {
            base_score,
            indicators,
            final_score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugSample {
    pub metric_id: String,
    pub sample_index: usize,
    pub file_path: Option<PathBuf>,
    pub prompt: String,
    pub response: Option<String>,
    pub duration_seconds: f64,
    pub error: Option<String>,
    pub trace: Option<ScoreTrace>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricResult {
    pub metric_id: String,
    pub score: i32,
    pub available: bool,
    pub debug_samples: Vec<DebugSample>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct C7Metrics {
    pub m1_task_consistency: Option<MetricResult>,
    pub m2_behavior_comprehension: Option<MetricResult>,
    pub m3_cross_file_navigation: Option<MetricResult>,
    pub m4_identifier_interpretability: Option<MetricResult>,
    pub m5_documentation_accuracy: Option<MetricResult>,
}

impl C7Metrics {
    pub fn results(&self) -> Vec<&MetricResult> {
        [
            &self.m1_task_consistency,
            &self.m2_behavior_comprehension,
            &self.m3_cross_file_navigation,
            &self.m4_identifier_interpretability,
            &self.m5_documentation_accuracy,
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    C1CodeHealth,
    C2SemanticExplicitness,
    C3Architecture,
    C4Documentation,
    C5TemporalDynamics,
    C6Testing,
    C7AgentEvaluation,
}

impl Category {
    pub fn key(&self) -> &'static str {
        match self {
            Category::C1CodeHealth => "c1",
            Category::C2SemanticExplicitness => "c2",
            Category::C3Architecture => "c3",
            Category::C4Documentation => "c4",
            Category::C5TemporalDynamics => "c5",
            Category::C6Testing => "c6",
            Category::C7AgentEvaluation => "c7",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::C1CodeHealth => "Code Health",
            Category::C2SemanticExplicitness => "Semantic Explicitness",
            Category::C3Architecture => "Architecture",
            Category::C4Documentation => "Documentation",
            Category::C5TemporalDynamics => "Temporal Dynamics",
            Category::C6Testing => "Testing",
            Category::C7AgentEvaluation => "Agent Evaluation",
        }
    }

    pub const ALL: [Category; 7] = [
        Category::C1CodeHealth,
        Category::C2SemanticExplicitness,
        Category::C3Architecture,
        Category::C4Documentation,
        Category::C5TemporalDynamics,
        Category::C6Testing,
        Category::C7AgentEvaluation,
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CategoryMetrics {
    C1(C1Metrics),
    C2(C2Metrics),
    C3(C3Metrics),
    C4(C4Metrics),
    C5(C5Metrics),
    C6(C6Metrics),
    C7(C7Metrics),
}

impl CategoryMetrics {
    /// A default-valued variant for the given category, used by tests that
    /// need to exercise an extractor without a full analyzer run.
    pub fn default_for(category: Category) -> Self {
        match category {
            Category::C1CodeHealth => CategoryMetrics::C1(C1Metrics::default()),
            Category::C2SemanticExplicitness => CategoryMetrics::C2(C2Metrics::default()),
            Category::C3Architecture => CategoryMetrics::C3(C3Metrics::default()),
            Category::C4Documentation => CategoryMetrics::C4(C4Metrics::default()),
            Category::C5TemporalDynamics => CategoryMetrics::C5(C5Metrics {
                available: true,
                ..C5Metrics::default()
            }),
            Category::C6Testing => CategoryMetrics::C6(C6Metrics::default()),
            Category::C7AgentEvaluation => CategoryMetrics::C7(C7Metrics::default()),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            CategoryMetrics::C1(_) => Category::C1CodeHealth,
            CategoryMetrics::C2(_) => Category::C2SemanticExplicitness,
            CategoryMetrics::C3(_) => Category::C3Architecture,
            CategoryMetrics::C4(_) => Category::C4Documentation,
            CategoryMetrics::C5(_) => Category::C5TemporalDynamics,
            CategoryMetrics::C6(_) => Category::C6Testing,
            CategoryMetrics::C7(_) => Category::C7AgentEvaluation,
        }
    }
}

/// Output of one analyzer's `Analyze` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub category: Category,
    pub metrics: CategoryMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_trace_final_score_matches_construction() {
        let trace = ScoreTrace::new(
            2,
            vec![
                ScoreIndicator {
                    name: "a".into(),
                    matched: true,
                    delta: 3,
                },
                ScoreIndicator {
                    name: "b".into(),
                    matched: false,
                    delta: 5, // should be zeroed because unmatched
                },
            ],
        );
        assert_eq!(trace.final_score, 5);
        assert_eq!(trace.indicators[1].delta, 0);
    }

    #[test]
    fn score_trace_clamps_to_one_and_ten() {
        let high = ScoreTrace::new(
            9,
            vec![ScoreIndicator {
                name: "a".into(),
                matched: true,
                delta: 10,
            }],
        );
        assert_eq!(high.final_score, 10);

        let low = ScoreTrace::new(
            1,
            vec![ScoreIndicator {
                name: "a".into(),
                matched: true,
                delta: -10,
            }],
        );
        assert_eq!(low.final_score, 1);
    }
}
