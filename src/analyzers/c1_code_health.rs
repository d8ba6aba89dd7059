//! C1 Code Health: cyclomatic complexity, function/file length, coupling,
//! and structural duplication (`spec.md` §4.2).

use crate::analyzers::CategoryAnalyzer;
use crate::complexity::{calculate_cyclomatic, detect_duplication};
use crate::core::{AnalysisTarget, Language};
use crate::errors::AgentReadinessError;
use crate::metrics::{AnalysisResult, C1Metrics, Category, CategoryMetrics, FileSizeRecord, FunctionComplexity};
use crate::parser::{RustParser, TreeSitterParser};
use std::collections::HashMap;
use std::path::Path;

pub struct C1Analyzer;

impl CategoryAnalyzer for C1Analyzer {
    fn analyze(&self, targets: &[AnalysisTarget]) -> Result<AnalysisResult, AgentReadinessError> {
        let mut functions = Vec::new();
        let mut file_sizes = Vec::new();
        let mut duplicate_blocks = Vec::new();
        let mut afferent_coupling: HashMap<String, u32> = HashMap::new();
        let mut efferent_coupling: HashMap<String, u32> = HashMap::new();

        let rust_parser = RustParser::new();
        let ts_parser = TreeSitterParser::new();

        for target in targets {
            match target.language {
                Language::Rust => {
                    let package = rust_parser.load(target)?;
                    for file in package.files.iter().filter(|f| !f.is_test) {
                        for item in &file.ast.items {
                            collect_rust_fn_metrics(item, &file.rel_path, &mut functions);
                        }
                        let lines = rust_file_line_count(&file.ast);
                        file_sizes.push(FileSizeRecord {
                            file: file.rel_path.clone(),
                            lines,
                        });
                    }
                    duplicate_blocks.extend(detect_duplication(
                        &package
                            .files
                            .iter()
                            .filter(|f| !f.is_test)
                            .cloned()
                            .collect::<Vec<_>>(),
                    ));
                    let (aff, eff) = rust_import_coupling(&package);
                    merge_coupling(&mut afferent_coupling, aff);
                    merge_coupling(&mut efferent_coupling, eff);
                }
                other => {
                    let loaded = ts_parser.load_all(target)?;
                    for (file, guard) in loaded.iter().filter(|(f, _)| !f.is_test) {
                        let root = guard.root_node();
                        count_treesitter_functions(other, &root, &guard.content, &file.rel_path, &mut functions);
                        let lines = root.end_position().row - root.start_position().row + 1;
                        file_sizes.push(FileSizeRecord {
                            file: file.rel_path.clone(),
                            lines,
                        });
                    }
                }
            }
        }

        functions.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));
        file_sizes.sort_by(|a, b| a.file.cmp(&b.file));

        let avg_cyclomatic_complexity = average(functions.iter().map(|f| f.cyclomatic as f64));
        let max_cyclomatic_complexity = functions.iter().map(|f| f.cyclomatic).max().unwrap_or(0);
        let avg_function_length = average(functions.iter().map(|f| f.length as f64));
        let max_function_length = functions.iter().map(|f| f.length).max().unwrap_or(0);
        let avg_file_size = average(file_sizes.iter().map(|f| f.lines as f64));

        let total_windows: usize = duplicate_blocks.iter().map(|d| d.occurrences.len()).sum();
        let total_lines: usize = file_sizes.iter().map(|f| f.lines).sum();
        let duplication_rate = if total_lines == 0 {
            0.0
        } else {
            (total_windows as f64 * 6.0 / total_lines as f64 * 100.0).min(100.0)
        };

        Ok(AnalysisResult {
            category: Category::C1CodeHealth,
            metrics: CategoryMetrics::C1(C1Metrics {
                avg_cyclomatic_complexity,
                max_cyclomatic_complexity,
                avg_function_length,
                max_function_length,
                avg_file_size,
                afferent_coupling,
                efferent_coupling,
                duplication_rate,
                functions,
                file_sizes,
                duplicate_blocks,
            }),
        })
    }
}

fn average(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let count = values.clone().count();
    if count == 0 {
        0.0
    } else {
        values.sum::<f64>() / count as f64
    }
}

fn merge_coupling(into: &mut HashMap<String, u32>, from: HashMap<String, u32>) {
    for (k, v) in from {
        *into.entry(k).or_insert(0) += v;
    }
}

/// File length from the AST's first/last item span, not from counting
/// lines of source text (`spec.md` §4.2). An item-free file (only inner
/// attributes, or genuinely empty) has no span to measure; treat it as
/// zero lines rather than guessing.
fn rust_file_line_count(ast: &syn::File) -> usize {
    use syn::spanned::Spanned;
    let start = ast.items.first().map(|i| i.span().start().line);
    let end = ast.items.last().map(|i| i.span().end().line);
    match (start, end) {
        (Some(start), Some(end)) => end.saturating_sub(start) + 1,
        _ => 0,
    }
}

fn collect_rust_fn_metrics(item: &syn::Item, rel_path: &Path, out: &mut Vec<FunctionComplexity>) {
    use syn::spanned::Spanned;
    match item {
        syn::Item::Fn(f) => {
            let cyclomatic = calculate_cyclomatic(&f.block);
            let start = f.block.span().start().line;
            let end = f.block.span().end().line;
            out.push(FunctionComplexity {
                file: rel_path.to_path_buf(),
                function: f.sig.ident.to_string(),
                line: f.sig.ident.span().start().line,
                cyclomatic,
                length: end.saturating_sub(start) + 1,
            });
        }
        syn::Item::Impl(imp) => {
            for item in &imp.items {
                if let syn::ImplItem::Fn(f) = item {
                    let cyclomatic = calculate_cyclomatic(&f.block);
                    let start = f.block.span().start().line;
                    let end = f.block.span().end().line;
                    out.push(FunctionComplexity {
                        file: rel_path.to_path_buf(),
                        function: f.sig.ident.to_string(),
                        line: f.sig.ident.span().start().line,
                        cyclomatic,
                        length: end.saturating_sub(start) + 1,
                    });
                }
            }
        }
        syn::Item::Mod(m) => {
            if let Some((_, items)) = &m.content {
                for it in items {
                    collect_rust_fn_metrics(it, rel_path, out);
                }
            }
        }
        _ => {}
    }
}

/// In-module import graph restricted to `use` paths whose first segment
/// names another file stem in the same package (a conservative stand-in
/// for real module-path resolution, sufficient for coupling counts without
/// a full module resolver).
fn rust_import_coupling(package: &crate::parser::ParsedPackage) -> (HashMap<String, u32>, HashMap<String, u32>) {
    let module_names: std::collections::HashSet<String> = package
        .files
        .iter()
        .filter_map(|f| f.rel_path.file_stem().map(|s| s.to_string_lossy().to_string()))
        .collect();

    let mut afferent: HashMap<String, u32> = HashMap::new();
    let mut efferent: HashMap<String, u32> = HashMap::new();

    for file in &package.files {
        let this_module = file
            .rel_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        for item in &file.ast.items {
            if let syn::Item::Use(u) = item {
                for target in use_tree_first_segments(&u.tree) {
                    if module_names.contains(&target) && target != this_module {
                        *efferent.entry(this_module.clone()).or_insert(0) += 1;
                        *afferent.entry(target).or_insert(0) += 1;
                    }
                }
            }
        }
    }
    (afferent, efferent)
}

fn use_tree_first_segments(tree: &syn::UseTree) -> Vec<String> {
    match tree {
        syn::UseTree::Path(p) => vec![p.ident.to_string()],
        syn::UseTree::Group(g) => g.items.iter().flat_map(use_tree_first_segments).collect(),
        syn::UseTree::Name(n) => vec![n.ident.to_string()],
        _ => Vec::new(),
    }
}

/// A conservative, shared tree-sitter cyclomatic-complexity walk:
/// `if`/`for`/`while`/`switch-case` nodes and `&&`/`||` operators each add
/// one, matching the Rust counting method's shape (`spec.md` §4.2), with
/// per-grammar node-kind names substituted for Python/JS/TS.
fn count_treesitter_functions(
    language: Language,
    root: &tree_sitter::Node,
    source: &str,
    rel_path: &Path,
    out: &mut Vec<FunctionComplexity>,
) {
    let func_kinds = function_node_kinds(language);
    let mut cursor = root.walk();
    walk_for_functions(&mut cursor, source, &func_kinds, language, rel_path, out);
}

fn function_node_kinds(language: Language) -> &'static [&'static str] {
    match language {
        Language::Python => &["function_definition"],
        Language::JavaScript => &["function_declaration", "method_definition", "arrow_function", "function"],
        Language::TypeScript => &["function_declaration", "method_definition", "arrow_function", "function"],
        Language::Rust => unreachable!(),
    }
}

fn branch_node_kinds(language: Language) -> &'static [&'static str] {
    match language {
        Language::Python => &["if_statement", "for_statement", "while_statement", "elif_clause"],
        Language::JavaScript | Language::TypeScript => &[
            "if_statement",
            "for_statement",
            "for_in_statement",
            "while_statement",
            "do_statement",
            "switch_case",
            "catch_clause",
            "ternary_expression",
        ],
        Language::Rust => unreachable!(),
    }
}

fn logical_op_kinds(language: Language) -> &'static [&'static str] {
    match language {
        Language::Python => &["boolean_operator"],
        Language::JavaScript | Language::TypeScript => &["logical_expression"],
        Language::Rust => unreachable!(),
    }
}

fn walk_for_functions(
    cursor: &mut tree_sitter::TreeCursor,
    source: &str,
    func_kinds: &[&str],
    language: Language,
    rel_path: &Path,
    out: &mut Vec<FunctionComplexity>,
) {
    let node = cursor.node();
    if func_kinds.contains(&node.kind()) {
        let cyclomatic = 1 + count_kind_occurrences(&node, branch_node_kinds(language))
            + count_kind_occurrences(&node, logical_op_kinds(language));
        let name = function_name(&node, source).unwrap_or_else(|| "<anonymous>".to_string());
        out.push(FunctionComplexity {
            file: rel_path.to_path_buf(),
            function: name,
            line: node.start_position().row + 1,
            cyclomatic,
            length: node.end_position().row - node.start_position().row + 1,
        });
    }
    if cursor.goto_first_child() {
        loop {
            walk_for_functions(cursor, source, func_kinds, language, rel_path, out);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
}

fn count_kind_occurrences(node: &tree_sitter::Node, kinds: &[&str]) -> u32 {
    let mut count = 0u32;
    let mut cursor = node.walk();
    count_kind_recursive(&mut cursor, kinds, &mut count);
    count
}

fn count_kind_recursive(cursor: &mut tree_sitter::TreeCursor, kinds: &[&str], count: &mut u32) {
    if kinds.contains(&cursor.node().kind()) {
        *count += 1;
    }
    if cursor.goto_first_child() {
        loop {
            count_kind_recursive(cursor, kinds, count);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
}

fn function_name(node: &tree_sitter::Node, source: &str) -> Option<String> {
    node.child_by_field_name("name")
        .and_then(|n| n.utf8_text(source.as_bytes()).ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FileClass;

    fn target(dir: &std::path::Path, files: &[(&str, &str)]) -> AnalysisTarget {
        let mut sources = Vec::new();
        for (name, content) in files {
            let path = dir.join(name);
            std::fs::write(&path, content).unwrap();
            sources.push(crate::core::SourceFile {
                path: path.clone(),
                rel_path: std::path::PathBuf::from(name),
                language: Language::Rust,
                class: FileClass::Source,
            });
        }
        AnalysisTarget {
            language: Language::Rust,
            root_dir: dir.to_path_buf(),
            files: sources,
        }
    }

    #[test]
    fn computes_averages_across_functions() {
        let dir = tempfile::tempdir().unwrap();
        let t = target(
            dir.path(),
            &[("lib.rs", "fn a() { if true {} }\nfn b() { }\n")],
        );
        let result = C1Analyzer.analyze(&[t]).unwrap();
        let CategoryMetrics::C1(m) = result.metrics else {
            panic!()
        };
        assert_eq!(m.functions.len(), 2);
        assert!(m.avg_cyclomatic_complexity > 1.0);
    }
}
