//! Default category weights, per-metric weights, and breakpoint tables.
//!
//! Mirrors the teacher's `config::scoring::ScoringWeights` shape
//! (named weight fields with `#[serde(default = "...")]`) but generalized
//! to a per-category `Vec<MetricConfig>` keyed by metric name, since this
//! spec's metric set is heterogeneous across seven categories rather than
//! the teacher's fixed six-factor record.
//!
//! Category weights and per-metric breakpoint tables are not numerically
//! specified by `spec.md` (an Open Question); the concrete defaults below
//! are this implementation's resolution, recorded in DESIGN.md, and are
//! overridable via the optional TOML config file.

use crate::metrics::Category;
use crate::scoring::breakpoints::Breakpoint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricConfig {
    pub name: String,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub breakpoints: Vec<Breakpoint>,
    /// Short human/AI-readable description used by report assembly's
    /// improvement-prompt rendering.
    #[serde(default)]
    pub description: String,
    /// "How to Improve" bullets threaded into the improvement prompt.
    #[serde(default)]
    pub how_to_improve: Vec<String>,
}

impl MetricConfig {
    fn new(
        name: &str,
        weight: f64,
        breakpoints: &[(f64, f64)],
        description: &str,
        how_to_improve: &[&str],
    ) -> Self {
        Self {
            name: name.to_string(),
            weight,
            breakpoints: breakpoints
                .iter()
                .map(|(v, s)| Breakpoint::new(*v, *s))
                .collect(),
            description: description.to_string(),
            how_to_improve: how_to_improve.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub category: Category,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub metrics: Vec<MetricConfig>,
}

impl CategoryConfig {
    pub fn metric(&self, name: &str) -> Option<&MetricConfig> {
        self.metrics.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
}

impl ScoringConfig {
    pub fn category(&self, category: Category) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.category == category)
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            categories: vec![
                c1_code_health(),
                c2_semantic_explicitness(),
                c3_architecture(),
                c4_documentation(),
                c5_temporal_dynamics(),
                c6_testing(),
                c7_agent_evaluation(),
            ],
        }
    }
}

fn c1_code_health() -> CategoryConfig {
    CategoryConfig {
        category: Category::C1CodeHealth,
        weight: 0.20,
        metrics: vec![
            MetricConfig::new(
                "avg_cyclomatic_complexity",
                0.25,
                &[(2.0, 10.0), (5.0, 8.0), (10.0, 6.0), (20.0, 3.0), (40.0, 1.0)],
                "Average cyclomatic complexity across all functions",
                &["Extract nested conditionals into named helper functions", "Replace branching chains with early returns or lookup tables"],
            ),
            MetricConfig::new(
                "max_cyclomatic_complexity",
                0.15,
                &[(5.0, 10.0), (10.0, 8.0), (20.0, 6.0), (35.0, 3.0), (60.0, 1.0)],
                "Cyclomatic complexity of the single worst function",
                &["Split the worst-offending function along its branching structure"],
            ),
            MetricConfig::new(
                "avg_function_length",
                0.15,
                &[(15.0, 10.0), (30.0, 8.0), (60.0, 6.0), (100.0, 3.0), (200.0, 1.0)],
                "Average function length in lines",
                &["Extract multi-step function bodies into single-responsibility helpers"],
            ),
            MetricConfig::new(
                "avg_file_size",
                0.10,
                &[(150.0, 10.0), (300.0, 8.0), (600.0, 6.0), (1000.0, 3.0), (2000.0, 1.0)],
                "Average file size in lines",
                &["Split large files along module or feature boundaries"],
            ),
            MetricConfig::new(
                "duplication_rate",
                0.20,
                &[(0.0, 10.0), (3.0, 8.0), (8.0, 6.0), (15.0, 3.0), (30.0, 1.0)],
                "Percentage of code in duplicated structural blocks",
                &["Factor duplicated blocks into a shared function", "Replace copy-pasted branches with a parameterized helper"],
            ),
            MetricConfig::new(
                "avg_coupling",
                0.15,
                &[(2.0, 10.0), (5.0, 8.0), (10.0, 6.0), (20.0, 3.0), (40.0, 1.0)],
                "Average afferent+efferent coupling per in-module package",
                &["Introduce a narrow interface between tightly coupled modules", "Invert dependencies so lower-level modules don't import higher-level ones"],
            ),
        ],
    }
}

fn c2_semantic_explicitness() -> CategoryConfig {
    CategoryConfig {
        category: Category::C2SemanticExplicitness,
        weight: 0.15,
        metrics: vec![
            MetricConfig::new(
                "type_annotation_coverage",
                0.30,
                &[(0.0, 1.0), (40.0, 3.0), (70.0, 6.0), (90.0, 8.0), (100.0, 10.0)],
                "Percentage of parameters and returns with explicit type annotations",
                &["Add type hints/annotations to public function signatures first"],
            ),
            MetricConfig::new(
                "naming_consistency",
                0.20,
                &[(0.0, 1.0), (50.0, 3.0), (75.0, 6.0), (90.0, 8.0), (100.0, 10.0)],
                "Percentage of identifiers following the language's naming convention",
                &["Rename identifiers to match the language's naming convention (snake_case functions, CamelCase types)"],
            ),
            MetricConfig::new(
                "magic_number_ratio_per_kloc",
                0.20,
                &[(0.0, 10.0), (2.0, 8.0), (5.0, 6.0), (10.0, 3.0), (20.0, 1.0)],
                "Unexplained numeric literals per thousand lines of code",
                &["Replace magic numbers with named constants"],
            ),
            MetricConfig::new(
                "null_safety_score",
                0.20,
                &[(0.0, 1.0), (40.0, 3.0), (70.0, 6.0), (90.0, 8.0), (100.0, 10.0)],
                "Decomposed null/optional-safety signal (see DESIGN.md)",
                &["Prefer Option/Result-returning APIs over sentinel null values"],
            ),
            MetricConfig::new(
                "type_strictness",
                0.10,
                &[(0.0, 1.0), (1.0, 10.0)],
                "Whether language-specific strict-typing configuration is present",
                &["Enable strict mode in the language's type-checker configuration"],
            ),
        ],
    }
}

fn c3_architecture() -> CategoryConfig {
    CategoryConfig {
        category: Category::C3Architecture,
        weight: 0.15,
        metrics: vec![
            MetricConfig::new(
                "max_directory_depth",
                0.15,
                &[(2.0, 10.0), (4.0, 8.0), (6.0, 6.0), (9.0, 3.0), (14.0, 1.0)],
                "Deepest directory nesting level",
                &["Flatten deeply nested module hierarchies"],
            ),
            MetricConfig::new(
                "avg_module_fanout",
                0.20,
                &[(2.0, 10.0), (5.0, 8.0), (10.0, 6.0), (18.0, 3.0), (30.0, 1.0)],
                "Average efferent coupling per in-module package",
                &["Reduce the number of modules any single module depends on"],
            ),
            MetricConfig::new(
                "circular_deps_count",
                0.30,
                &[(0.0, 10.0), (1.0, 6.0), (3.0, 3.0), (6.0, 1.0)],
                "Number of detected circular import dependencies",
                &["Break the cycle by extracting the shared contract into a lower-level module"],
            ),
            MetricConfig::new(
                "import_complexity",
                0.20,
                &[(2.0, 10.0), (5.0, 8.0), (10.0, 6.0), (18.0, 3.0), (30.0, 1.0)],
                "Aggregate import graph complexity",
                &["Reduce cross-module import fan-out"],
            ),
            MetricConfig::new(
                "dead_export_count",
                0.15,
                &[(0.0, 10.0), (3.0, 8.0), (8.0, 6.0), (15.0, 3.0), (30.0, 1.0)],
                "Exported symbols with no in-module importer",
                &["Remove unused exports or make them private"],
            ),
        ],
    }
}

fn c4_documentation() -> CategoryConfig {
    CategoryConfig {
        category: Category::C4Documentation,
        weight: 0.10,
        metrics: vec![
            MetricConfig::new(
                "readme_word_count",
                0.15,
                &[(0.0, 1.0), (100.0, 4.0), (300.0, 7.0), (600.0, 9.0), (1200.0, 10.0)],
                "Word count of the repo-root README",
                &["Expand the README with setup, usage, and architecture sections"],
            ),
            MetricConfig::new(
                "comment_density",
                0.25,
                &[(0.0, 1.0), (5.0, 4.0), (10.0, 6.0), (20.0, 8.0), (35.0, 10.0)],
                "Percentage of comment nodes relative to declaration nodes",
                &["Document the non-obvious invariants in complex functions"],
            ),
            MetricConfig::new(
                "api_doc_coverage",
                0.30,
                &[(0.0, 1.0), (25.0, 4.0), (50.0, 6.0), (75.0, 8.0), (100.0, 10.0)],
                "Percentage of public items with a doc comment",
                &["Add doc comments to exported functions and types, starting with the least-documented file"],
            ),
            MetricConfig::new(
                "has_changelog",
                0.10,
                &[(0.0, 1.0), (1.0, 10.0)],
                "Whether a CHANGELOG file is present",
                &["Add a CHANGELOG documenting notable changes per release"],
            ),
            MetricConfig::new(
                "has_examples",
                0.10,
                &[(0.0, 1.0), (1.0, 10.0)],
                "Whether runnable examples are present",
                &["Add a runnable example demonstrating the primary API"],
            ),
            MetricConfig::new(
                "has_contributing",
                0.05,
                &[(0.0, 1.0), (1.0, 10.0)],
                "Whether a CONTRIBUTING guide is present",
                &["Add a CONTRIBUTING guide covering setup and PR expectations"],
            ),
            MetricConfig::new(
                "has_diagrams",
                0.05,
                &[(0.0, 1.0), (1.0, 10.0)],
                "Whether architecture diagrams are present",
                &["Add a diagram of the major components and their data flow"],
            ),
        ],
    }
}

fn c5_temporal_dynamics() -> CategoryConfig {
    CategoryConfig {
        category: Category::C5TemporalDynamics,
        weight: 0.10,
        metrics: vec![
            MetricConfig::new(
                "churn_rate",
                0.20,
                &[(5.0, 10.0), (15.0, 8.0), (30.0, 6.0), (60.0, 3.0), (120.0, 1.0)],
                "Average lines changed per commit over a 90-day window",
                &["Break large commits into smaller, reviewable changes"],
            ),
            MetricConfig::new(
                "temporal_coupling_pct",
                0.20,
                &[(0.0, 10.0), (10.0, 8.0), (25.0, 6.0), (45.0, 3.0), (70.0, 1.0)],
                "Percentage of eligible file pairs that change together",
                &["Merge files that always change together, or split out the shared concern they both depend on"],
            ),
            MetricConfig::new(
                "author_fragmentation",
                0.15,
                &[(1.0, 10.0), (2.0, 8.0), (3.5, 6.0), (5.0, 3.0), (8.0, 1.0)],
                "Average distinct authors per file over a 90-day window",
                &["Assign clearer file/module ownership"],
            ),
            MetricConfig::new(
                "commit_stability_days",
                0.20,
                &[(1.0, 1.0), (5.0, 3.0), (10.0, 6.0), (20.0, 8.0), (30.0, 10.0)],
                "Median days between consecutive changes to the same file",
                &["Stabilize frequently-churned files by finishing their design before merging"],
            ),
            MetricConfig::new(
                "hotspot_concentration",
                0.25,
                &[(10.0, 10.0), (20.0, 8.0), (35.0, 6.0), (50.0, 3.0), (70.0, 1.0)],
                "Share of all changes concentrated in the top-decile files",
                &["Refactor or add tests to the top hotspot files to reduce change risk"],
            ),
        ],
    }
}

fn c6_testing() -> CategoryConfig {
    CategoryConfig {
        category: Category::C6Testing,
        weight: 0.15,
        metrics: vec![
            MetricConfig::new(
                "test_to_code_ratio",
                0.25,
                &[(0.0, 1.0), (0.2, 4.0), (0.5, 7.0), (0.8, 9.0), (1.2, 10.0)],
                "Ratio of test files to source files",
                &["Add test files alongside the least-covered source modules"],
            ),
            MetricConfig::new(
                "coverage_pct",
                0.30,
                &[(0.0, 1.0), (30.0, 4.0), (60.0, 6.0), (80.0, 8.0), (95.0, 10.0)],
                "Line/statement coverage percentage",
                &["Add tests covering the least-exercised modules first"],
            ),
            MetricConfig::new(
                "test_isolation_pct",
                0.20,
                &[(0.0, 1.0), (40.0, 4.0), (70.0, 7.0), (90.0, 9.0), (100.0, 10.0)],
                "Percentage of test files free of network/DB/subprocess imports",
                &["Replace live network/DB/subprocess calls in tests with fakes or fixtures"],
            ),
            MetricConfig::new(
                "avg_assertion_density",
                0.25,
                &[(0.0, 1.0), (0.5, 4.0), (1.5, 7.0), (3.0, 9.0), (5.0, 10.0)],
                "Average assertions per test function",
                &["Add meaningful assertions to tests that only exercise code without checking outcomes"],
            ),
        ],
    }
}

fn c7_agent_evaluation() -> CategoryConfig {
    // C7 raw values are already agent-evaluation scores in [1,10]
    // (spec.md §4.4); the breakpoint table is the identity mapping.
    let identity = &[(1.0, 1.0), (10.0, 10.0)];
    CategoryConfig {
        category: Category::C7AgentEvaluation,
        weight: 0.15,
        metrics: vec![
            MetricConfig::new(
                "m1_task_consistency",
                0.20,
                identity,
                "Agent's ability to restate a file's primary responsibility consistently",
                &["Clarify the module's single responsibility in its top-level doc comment"],
            ),
            MetricConfig::new(
                "m2_behavior_comprehension",
                0.20,
                identity,
                "Agent's ability to explain a complex function's behavior correctly",
                &["Simplify the function's control flow or document its edge cases"],
            ),
            MetricConfig::new(
                "m3_cross_file_navigation",
                0.20,
                identity,
                "Agent's ability to trace a call across module boundaries",
                &["Keep call chains shallow across module boundaries; name re-exports clearly"],
            ),
            MetricConfig::new(
                "m4_identifier_interpretability",
                0.20,
                identity,
                "Agent's ability to infer an identifier's purpose from its name alone",
                &["Rename identifiers whose purpose isn't inferable from the name alone"],
            ),
            MetricConfig::new(
                "m5_documentation_accuracy",
                0.20,
                identity,
                "Agent's ability to detect whether existing doc comments still match behavior",
                &["Update stale doc comments to match current behavior"],
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_weight_sums_to_one_across_categories() {
        let cfg = ScoringConfig::default();
        let total: f64 = cfg.categories.iter().map(|c| c.weight).sum();
        assert!((total - 1.0).abs() < 1e-9, "category weights sum to {total}");
    }

    #[test]
    fn every_category_metric_weights_sum_to_one() {
        let cfg = ScoringConfig::default();
        for cat in &cfg.categories {
            let total: f64 = cat.metrics.iter().map(|m| m.weight).sum();
            assert!(
                (total - 1.0).abs() < 1e-9,
                "{:?} metric weights sum to {total}",
                cat.category
            );
        }
    }

    #[test]
    fn has_seven_categories_and_c7_has_five_metrics() {
        let cfg = ScoringConfig::default();
        assert_eq!(cfg.categories.len(), 7);
        let c7 = cfg.category(Category::C7AgentEvaluation).unwrap();
        assert_eq!(c7.metrics.len(), 5);
    }

    #[test]
    fn total_metric_count_is_approximately_38() {
        let cfg = ScoringConfig::default();
        let total: usize = cfg.categories.iter().map(|c| c.metrics.len()).sum();
        assert!((30..=40).contains(&total), "total metrics: {total}");
    }
}
