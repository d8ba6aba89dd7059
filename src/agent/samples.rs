//! Sample selection for the five C7 metrics. Rules fixed in `SPEC_FULL.md`
//! §4.4 (an Open Question `spec.md` §9 leaves to the implementer, recorded
//! here and in DESIGN.md):
//!
//! | Metric | Max samples | Eligibility |
//! |---|---|---|
//! | M1 | 3 | top-3 files by C1 cyclomatic complexity sum |
//! | M2 | 3 | functions with cyclomatic >= 10, highest first |
//! | M3 | 3 | modules with highest afferent coupling (fan-in) |
//! | M4 | 5 | exported identifiers, evenly sampled by sorted (file, line) |
//! | M5 | 3 | public items with a doc comment, longest doc first |

use crate::core::{AnalysisTarget, Language};
use crate::metrics::{AnalysisResult, CategoryMetrics};
use crate::parser::RustParser;
use std::collections::HashMap;
use std::path::PathBuf;

pub enum SampleContext {
    FileResponsibility {
        file: PathBuf,
    },
    FunctionBehavior {
        file: PathBuf,
        function: String,
        line: usize,
        cyclomatic: u32,
    },
    ModuleBoundary {
        module: String,
        fan_in: u32,
    },
    Identifier {
        file: PathBuf,
        line: usize,
        name: String,
    },
    DocComment {
        file: PathBuf,
        line: usize,
        name: String,
        doc: String,
    },
}

impl SampleContext {
    pub fn file_path(&self) -> Option<PathBuf> {
        match self {
            SampleContext::FileResponsibility { file } => Some(file.clone()),
            SampleContext::FunctionBehavior { file, .. } => Some(file.clone()),
            SampleContext::ModuleBoundary { .. } => None,
            SampleContext::Identifier { file, .. } => Some(file.clone()),
            SampleContext::DocComment { file, .. } => Some(file.clone()),
        }
    }

    pub fn to_prompt(&self) -> String {
        use crate::agent::prompts;
        match self {
            SampleContext::FileResponsibility { file } => prompts::m1_prompt(&file.display().to_string()),
            SampleContext::FunctionBehavior {
                file,
                function,
                line,
                cyclomatic,
            } => prompts::m2_prompt(&file.display().to_string(), function, *line, *cyclomatic),
            SampleContext::ModuleBoundary { module, fan_in } => prompts::m3_prompt(module, *fan_in),
            SampleContext::Identifier { file, line, name } => {
                prompts::m4_prompt(&file.display().to_string(), *line, name)
            }
            SampleContext::DocComment { file, line, name, doc } => {
                prompts::m5_prompt(&file.display().to_string(), *line, name, doc)
            }
        }
    }
}

fn find_c1(prior: &[AnalysisResult]) -> Option<&crate::metrics::C1Metrics> {
    prior.iter().find_map(|r| match &r.metrics {
        CategoryMetrics::C1(m) => Some(m),
        _ => None,
    })
}

/// Top-3 files by summed cyclomatic complexity, file path ascending to
/// break ties deterministically.
pub fn select_m1(prior: &[AnalysisResult]) -> Vec<SampleContext> {
    let Some(c1) = find_c1(prior) else { return Vec::new() };
    let mut by_file: HashMap<PathBuf, u32> = HashMap::new();
    for f in &c1.functions {
        *by_file.entry(f.file.clone()).or_insert(0) += f.cyclomatic;
    }
    let mut files: Vec<(PathBuf, u32)> = by_file.into_iter().collect();
    files.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    files
        .into_iter()
        .take(3)
        .map(|(file, _)| SampleContext::FileResponsibility { file })
        .collect()
}

/// Functions with cyclomatic complexity >= 10, highest first, top-3.
pub fn select_m2(prior: &[AnalysisResult]) -> Vec<SampleContext> {
    let Some(c1) = find_c1(prior) else { return Vec::new() };
    let mut functions = c1.functions.clone();
    functions.retain(|f| f.cyclomatic >= 10);
    functions.sort_by(|a, b| b.cyclomatic.cmp(&a.cyclomatic).then(a.file.cmp(&b.file)).then(a.line.cmp(&b.line)));
    functions
        .into_iter()
        .take(3)
        .map(|f| SampleContext::FunctionBehavior {
            file: f.file,
            function: f.function,
            line: f.line,
            cyclomatic: f.cyclomatic,
        })
        .collect()
}

/// Modules with the highest afferent coupling (fan-in) in the in-module
/// import graph, top-3. Grounded on `C1Metrics::afferent_coupling`, the
/// same import-graph construction C3 uses, since `CategoryMetrics` stores
/// only the cycle list and aggregate fanout rather than raw edges.
pub fn select_m3(prior: &[AnalysisResult]) -> Vec<SampleContext> {
    let Some(c1) = find_c1(prior) else { return Vec::new() };
    let mut modules: Vec<(&String, &u32)> = c1.afferent_coupling.iter().collect();
    modules.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    modules
        .into_iter()
        .take(3)
        .map(|(module, fan_in)| SampleContext::ModuleBoundary {
            module: module.clone(),
            fan_in: *fan_in,
        })
        .collect()
}

/// Exported identifiers sampled evenly across files, deterministic by
/// sorted `(file, line)`, up to 5. Re-parses Rust targets directly (the
/// same pure `Analyze(targets)` pattern as C1-C6) for the type universe's
/// `is_pub` flag, which `CategoryMetrics` does not retain in full.
pub fn select_m4(targets: &[AnalysisTarget]) -> Vec<SampleContext> {
    let mut items = public_items(targets);
    items.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    if items.is_empty() {
        return Vec::new();
    }
    let stride = (items.len() as f64 / 5.0).max(1.0);
    let mut selected = Vec::new();
    let mut i = 0.0;
    while selected.len() < 5 && (i as usize) < items.len() {
        let (file, line, name, _doc) = &items[i as usize];
        selected.push(SampleContext::Identifier {
            file: file.clone(),
            line: *line,
            name: name.clone(),
        });
        i += stride;
    }
    selected
}

/// Public items carrying a doc comment, longest doc first, top-3.
pub fn select_m5(targets: &[AnalysisTarget]) -> Vec<SampleContext> {
    let mut items: Vec<_> = public_items(targets).into_iter().filter(|(_, _, _, doc)| doc.is_some()).collect();
    items.sort_by(|a, b| {
        b.3.as_ref()
            .map(|d| d.len())
            .unwrap_or(0)
            .cmp(&a.3.as_ref().map(|d| d.len()).unwrap_or(0))
            .then(a.0.cmp(&b.0))
            .then(a.1.cmp(&b.1))
    });
    items
        .into_iter()
        .take(3)
        .map(|(file, line, name, doc)| SampleContext::DocComment {
            file,
            line,
            name,
            doc: doc.unwrap_or_default(),
        })
        .collect()
}

type PublicItem = (PathBuf, usize, String, Option<String>);

fn public_items(targets: &[AnalysisTarget]) -> Vec<PublicItem> {
    let parser = RustParser::new();
    let mut items = Vec::new();
    for target in targets.iter().filter(|t| t.language == Language::Rust) {
        let Ok(package) = parser.load(target) else { continue };
        for item in &package.type_universe.items {
            if item.is_pub {
                items.push((item.file.clone(), item.line, item.name.clone(), item.doc.clone()));
            }
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{C1Metrics, Category, CategoryMetrics, FunctionComplexity};

    fn c1_result(functions: Vec<FunctionComplexity>) -> AnalysisResult {
        AnalysisResult {
            category: Category::C1CodeHealth,
            metrics: CategoryMetrics::C1(C1Metrics {
                functions,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn m2_only_selects_high_complexity_functions() {
        let functions = vec![
            FunctionComplexity { file: "a.rs".into(), function: "low".into(), line: 1, cyclomatic: 3, length: 10 },
            FunctionComplexity { file: "b.rs".into(), function: "high".into(), line: 2, cyclomatic: 15, length: 10 },
        ];
        let samples = select_m2(&[c1_result(functions)]);
        assert_eq!(samples.len(), 1);
        match &samples[0] {
            SampleContext::FunctionBehavior { function, .. } => assert_eq!(function, "high"),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn m1_aggregates_complexity_per_file_and_caps_at_three() {
        let functions = (0..5)
            .map(|i| FunctionComplexity {
                file: PathBuf::from(format!("f{i}.rs")),
                function: "f".into(),
                line: 1,
                cyclomatic: (i + 1) as u32,
                length: 10,
            })
            .collect();
        let samples = select_m1(&[c1_result(functions)]);
        assert_eq!(samples.len(), 3);
    }
}
