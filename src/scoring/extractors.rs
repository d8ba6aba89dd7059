//! Per-category extractors: `CategoryMetrics` -> `(raw, unavailable,
//! evidence)` triples keyed by the metric names declared in
//! `scoring::config` (`spec.md` §4.5).
//!
//! Every metric key declared for a category is always present in all three
//! maps (`spec.md` §8 invariant 4): unavailable metrics still get a `0.0`
//! raw value, `true` in `unavailable`, and a non-nil (possibly empty)
//! evidence slice.

use crate::metrics::{CategoryMetrics, CoverageSource};
use crate::scoring::engine::Extraction;
use crate::scoring::EvidenceItem;
use std::collections::HashMap;

const MAX_EVIDENCE: usize = 5;

fn evidence_item(file: &std::path::Path, line: usize, value: f64, description: impl Into<String>) -> EvidenceItem {
    EvidenceItem {
        file_path: file.to_path_buf(),
        line,
        value,
        description: description.into(),
    }
}

/// Builder for one category's extraction, reducing boilerplate across the
/// per-category functions below: every metric is registered once with its
/// raw value (`None` meaning unavailable) and its evidence list.
struct Builder {
    raw: HashMap<String, f64>,
    unavailable: HashMap<String, bool>,
    evidence: HashMap<String, Vec<EvidenceItem>>,
}

impl Builder {
    fn new() -> Self {
        Self {
            raw: HashMap::new(),
            unavailable: HashMap::new(),
            evidence: HashMap::new(),
        }
    }

    fn metric(&mut self, name: &str, value: Option<f64>, mut ev: Vec<EvidenceItem>) {
        ev.truncate(MAX_EVIDENCE);
        self.raw.insert(name.to_string(), value.unwrap_or(0.0));
        self.unavailable.insert(name.to_string(), value.is_none());
        self.evidence.insert(name.to_string(), ev);
    }

    fn finish(self) -> Extraction {
        Extraction {
            raw: self.raw,
            unavailable: self.unavailable,
            evidence: self.evidence,
        }
    }
}

pub fn extract(metrics: &CategoryMetrics) -> Extraction {
    match metrics {
        CategoryMetrics::C1(m) => extract_c1(m),
        CategoryMetrics::C2(m) => extract_c2(m),
        CategoryMetrics::C3(m) => extract_c3(m),
        CategoryMetrics::C4(m) => extract_c4(m),
        CategoryMetrics::C5(m) => extract_c5(m),
        CategoryMetrics::C6(m) => extract_c6(m),
        CategoryMetrics::C7(m) => extract_c7(m),
    }
}

fn extract_c1(m: &crate::metrics::C1Metrics) -> Extraction {
    let mut b = Builder::new();

    let mut by_complexity = m.functions.clone();
    by_complexity.sort_by(|a, c| {
        c.cyclomatic
            .cmp(&a.cyclomatic)
            .then(a.file.cmp(&c.file))
            .then(a.line.cmp(&c.line))
    });
    let complexity_evidence: Vec<EvidenceItem> = by_complexity
        .iter()
        .map(|f| evidence_item(&f.file, f.line, f.cyclomatic as f64, format!("{} has cyclomatic complexity {}", f.function, f.cyclomatic)))
        .collect();
    b.metric("avg_cyclomatic_complexity", Some(m.avg_cyclomatic_complexity), complexity_evidence.clone());
    b.metric("max_cyclomatic_complexity", Some(m.max_cyclomatic_complexity as f64), complexity_evidence);

    let mut by_length = m.functions.clone();
    by_length.sort_by(|a, c| {
        c.length
            .cmp(&a.length)
            .then(a.file.cmp(&c.file))
            .then(a.line.cmp(&c.line))
    });
    let length_evidence = by_length
        .iter()
        .map(|f| evidence_item(&f.file, f.line, f.length as f64, format!("{} is {} lines long", f.function, f.length)))
        .collect();
    b.metric("avg_function_length", Some(m.avg_function_length), length_evidence);

    let mut by_size = m.file_sizes.clone();
    by_size.sort_by(|a, c| c.lines.cmp(&a.lines).then(a.file.cmp(&c.file)));
    let size_evidence = by_size
        .iter()
        .map(|f| evidence_item(&f.file, 1, f.lines as f64, format!("{} lines", f.lines)))
        .collect();
    b.metric("avg_file_size", Some(m.avg_file_size), size_evidence);

    let mut by_dup = m.duplicate_blocks.clone();
    by_dup.sort_by(|a, c| {
        c.occurrences
            .len()
            .cmp(&a.occurrences.len())
            .then_with(|| a.occurrences.first().cmp(&c.occurrences.first()))
    });
    let dup_evidence = by_dup
        .iter()
        .filter_map(|d| {
            d.occurrences.first().map(|(file, line)| {
                evidence_item(
                    file,
                    *line,
                    d.occurrences.len() as f64,
                    format!("{}-statement block duplicated {} times", d.statement_count, d.occurrences.len()),
                )
            })
        })
        .collect();
    b.metric("duplication_rate", Some(m.duplication_rate), dup_evidence);

    let avg_coupling = {
        let total: u32 = m.afferent_coupling.values().sum::<u32>() + m.efferent_coupling.values().sum::<u32>();
        let count = m.afferent_coupling.len().max(m.efferent_coupling.len());
        if count == 0 { 0.0 } else { total as f64 / count as f64 }
    };
    let mut coupling_pairs: Vec<(&String, u32)> = m
        .efferent_coupling
        .iter()
        .map(|(k, v)| (k, *v + m.afferent_coupling.get(k).copied().unwrap_or(0)))
        .collect();
    coupling_pairs.sort_by(|a, c| c.1.cmp(&a.1).then(a.0.cmp(c.0)));
    let coupling_evidence = coupling_pairs
        .iter()
        .map(|(pkg, total)| evidence_item(std::path::Path::new(pkg.as_str()), 1, *total as f64, format!("{pkg} has total coupling {total}")))
        .collect();
    b.metric("avg_coupling", Some(avg_coupling), coupling_evidence);

    b.finish()
}

fn extract_c2(m: &crate::metrics::C2Metrics) -> Extraction {
    let mut b = Builder::new();

    b.metric("type_annotation_coverage", Some(m.aggregate_type_annotation_coverage), Vec::new());

    let mut violations: Vec<_> = m
        .per_language
        .iter()
        .flat_map(|p| p.naming_violations.iter())
        .collect();
    violations.sort_by(|a, c| a.file.cmp(&c.file).then(a.line.cmp(&c.line)));
    let naming_evidence = violations
        .iter()
        .map(|v| evidence_item(&v.file, v.line, 0.0, format!("{} should be {}", v.identifier, v.expected_convention)))
        .collect();
    b.metric("naming_consistency", Some(m.aggregate_naming_consistency), naming_evidence);

    let mut magic: Vec<_> = m.per_language.iter().flat_map(|p| p.magic_numbers.iter()).collect();
    magic.sort_by(|a, c| a.file.cmp(&c.file).then(a.line.cmp(&c.line)));
    let magic_evidence = magic
        .iter()
        .map(|n| evidence_item(&n.file, n.line, 0.0, format!("magic number {}", n.literal)))
        .collect();
    b.metric("magic_number_ratio_per_kloc", Some(m.aggregate_magic_number_ratio_per_kloc), magic_evidence);

    b.metric("null_safety_score", Some(m.aggregate_null_safety_score), Vec::new());
    b.metric("type_strictness", Some(if m.any_type_strictness { 1.0 } else { 0.0 }), Vec::new());

    b.finish()
}

fn extract_c3(m: &crate::metrics::C3Metrics) -> Extraction {
    let mut b = Builder::new();

    b.metric("max_directory_depth", Some(m.max_directory_depth as f64), Vec::new());
    b.metric("avg_module_fanout", Some(m.avg_module_fanout), Vec::new());

    let cycle_evidence = m
        .circular_dependencies
        .iter()
        .map(|cycle| {
            evidence_item(
                std::path::Path::new(cycle.first().map(|s| s.as_str()).unwrap_or("")),
                1,
                cycle.len() as f64,
                format!("cycle: {}", cycle.join(" -> ")),
            )
        })
        .collect();
    b.metric("circular_deps_count", Some(m.circular_dependencies.len() as f64), cycle_evidence);

    b.metric("import_complexity", Some(m.import_complexity), Vec::new());

    let mut dead = m.dead_exports.clone();
    dead.sort_by(|a, c| a.file.cmp(&c.file).then(a.line.cmp(&c.line)));
    let dead_evidence = dead
        .iter()
        .map(|d| evidence_item(&d.file, d.line, 0.0, format!("exported symbol `{}` has no in-module importer", d.symbol)))
        .collect();
    b.metric("dead_export_count", Some(m.dead_exports.len() as f64), dead_evidence);

    b.finish()
}

fn extract_c4(m: &crate::metrics::C4Metrics) -> Extraction {
    let mut b = Builder::new();

    b.metric("readme_word_count", Some(m.readme_word_count as f64), Vec::new());
    b.metric("comment_density", Some(m.comment_density), Vec::new());

    let mut undocumented = m.undocumented_public_items.clone();
    undocumented.sort_by(|a, c| a.file.cmp(&c.file).then(a.line.cmp(&c.line)));
    let api_evidence = undocumented
        .iter()
        .map(|d| evidence_item(&d.file, d.line, 0.0, format!("`{}` has no doc comment", d.symbol)))
        .collect();
    b.metric("api_doc_coverage", Some(m.api_doc_coverage), api_evidence);

    b.metric("has_changelog", Some(if m.has_changelog { 1.0 } else { 0.0 }), Vec::new());
    b.metric("has_examples", Some(if m.has_examples { 1.0 } else { 0.0 }), Vec::new());
    b.metric("has_contributing", Some(if m.has_contributing { 1.0 } else { 0.0 }), Vec::new());
    b.metric("has_diagrams", Some(if m.has_diagrams { 1.0 } else { 0.0 }), Vec::new());

    b.finish()
}

fn extract_c5(m: &crate::metrics::C5Metrics) -> Extraction {
    let mut b = Builder::new();

    if !m.available {
        for name in [
            "churn_rate",
            "temporal_coupling_pct",
            "author_fragmentation",
            "commit_stability_days",
            "hotspot_concentration",
        ] {
            b.metric(name, None, Vec::new());
        }
        return b.finish();
    }

    b.metric("churn_rate", Some(m.churn_rate), Vec::new());

    let mut pairs = m.coupled_pairs.clone();
    pairs.sort_by(|a, c| {
        c.coupling_ratio
            .partial_cmp(&a.coupling_ratio)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.file_a.cmp(&c.file_a))
    });
    let coupling_evidence = pairs
        .iter()
        .map(|p| {
            evidence_item(
                &p.file_a,
                1,
                p.coupling_ratio,
                format!("{} <-> {} ({} shared commits)", p.file_a.display(), p.file_b.display(), p.shared_commits),
            )
        })
        .collect();
    b.metric("temporal_coupling_pct", Some(m.temporal_coupling_pct), coupling_evidence);

    b.metric("author_fragmentation", Some(m.author_fragmentation), Vec::new());
    b.metric("commit_stability_days", Some(m.commit_stability_days), Vec::new());

    let mut hotspots = m.top_hotspots.clone();
    hotspots.sort_by(|a, c| c.changes.cmp(&a.changes).then(a.file.cmp(&c.file)));
    let hotspot_evidence = hotspots
        .iter()
        .map(|h| evidence_item(&h.file, 1, h.changes as f64, format!("{} changes", h.changes)))
        .collect();
    b.metric("hotspot_concentration", Some(m.hotspot_concentration), hotspot_evidence);

    b.finish()
}

fn extract_c6(m: &crate::metrics::C6Metrics) -> Extraction {
    let mut b = Builder::new();

    b.metric("test_to_code_ratio", Some(m.test_to_code_ratio), Vec::new());

    let coverage = match m.coverage_source {
        Some(CoverageSource::None) | None => None,
        Some(_) => m.coverage_pct,
    };
    b.metric("coverage_pct", coverage, Vec::new());

    b.metric("test_isolation_pct", Some(m.test_isolation_pct), Vec::new());

    let mut by_assertions = m.tests.clone();
    by_assertions.sort_by(|a, c| {
        a.assertion_count
            .cmp(&c.assertion_count)
            .then(a.file.cmp(&c.file))
            .then(a.line.cmp(&c.line))
    });
    let assertion_evidence = by_assertions
        .iter()
        .map(|t| evidence_item(&t.file, t.line, t.assertion_count as f64, format!("{} has {} assertions", t.name, t.assertion_count)))
        .collect();
    b.metric("avg_assertion_density", Some(m.avg_assertion_density), assertion_evidence);

    b.finish()
}

fn extract_c7(m: &crate::metrics::C7Metrics) -> Extraction {
    let mut b = Builder::new();
    let entries: [(&str, &Option<crate::metrics::MetricResult>); 5] = [
        ("m1_task_consistency", &m.m1_task_consistency),
        ("m2_behavior_comprehension", &m.m2_behavior_comprehension),
        ("m3_cross_file_navigation", &m.m3_cross_file_navigation),
        ("m4_identifier_interpretability", &m.m4_identifier_interpretability),
        ("m5_documentation_accuracy", &m.m5_documentation_accuracy),
    ];
    for (name, result) in entries {
        // C7 evidence is empty by design; trace data flows via DebugSamples
        // threaded separately into the report (spec.md §4.5).
        match result {
            Some(r) if r.available => b.metric(name, Some(r.score as f64), Vec::new()),
            _ => b.metric(name, None, Vec::new()),
        }
    }
    b.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{C1Metrics, FunctionComplexity};
    use std::path::PathBuf;

    #[test]
    fn c1_evidence_top_five_descending_complexity() {
        let complexities = [1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 2, 2];
        let functions: Vec<FunctionComplexity> = complexities
            .iter()
            .enumerate()
            .map(|(i, c)| FunctionComplexity {
                file: PathBuf::from(format!("f{i}.rs")),
                function: format!("f{i}"),
                line: i,
                cyclomatic: *c,
                length: 10,
            })
            .collect();
        let m = C1Metrics {
            functions,
            ..Default::default()
        };
        let extraction = extract_c1(&m);
        let ev = &extraction.evidence["avg_cyclomatic_complexity"];
        assert_eq!(ev.len(), 5);
        let values: Vec<f64> = ev.iter().map(|e| e.value).collect();
        assert_eq!(values, vec![89.0, 55.0, 34.0, 21.0, 13.0]);
    }

    #[test]
    fn every_configured_metric_key_present_in_all_three_maps() {
        use crate::scoring::config::ScoringConfig;
        let config = ScoringConfig::default();
        for cat in &config.categories {
            let metrics = crate::metrics::CategoryMetrics::default_for(cat.category);
            let extraction = extract(&metrics);
            for metric in &cat.metrics {
                assert!(extraction.raw.contains_key(&metric.name), "{}", metric.name);
                assert!(extraction.unavailable.contains_key(&metric.name), "{}", metric.name);
                assert!(extraction.evidence.contains_key(&metric.name), "{}", metric.name);
            }
        }
    }
}
