//! C3 Architecture: directory depth, module fanout, circular-dependency
//! detection (tri-color DFS over an opaque-id import graph), import
//! complexity, and dead-export detection (`spec.md` §4.2).
//!
//! Dead-export detection is implemented for the type-aware language
//! (Rust), where the type universe gives a whole-module reference index;
//! for the tree-sitter languages it is conservatively left empty rather
//! than guessed at cross-file reference resolution without a resolver
//! (recorded in DESIGN.md).

use crate::analyzers::CategoryAnalyzer;
use crate::core::{AnalysisTarget, Language};
use crate::errors::AgentReadinessError;
use crate::metrics::{AnalysisResult, C3Metrics, Category, CategoryMetrics, DeadExport};
use crate::parser::{ParsedPackage, RustParser, TreeSitterParser};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

pub struct C3Analyzer;

impl CategoryAnalyzer for C3Analyzer {
    fn analyze(&self, targets: &[AnalysisTarget]) -> Result<AnalysisResult, AgentReadinessError> {
        let mut max_directory_depth = 0usize;
        let mut edges: Vec<(String, String)> = Vec::new();
        let mut modules: HashSet<String> = HashSet::new();
        let mut fanout: HashMap<String, u32> = HashMap::new();
        let mut dead_exports = Vec::new();

        let rust_parser = RustParser::new();
        let ts_parser = TreeSitterParser::new();

        for target in targets {
            for file in &target.files {
                max_directory_depth = max_directory_depth.max(file.rel_path.components().count().saturating_sub(1));
            }

            match target.language {
                Language::Rust => {
                    let package = rust_parser.load(target)?;
                    let (mods, file_edges) = rust_module_graph(&package);
                    for m in &mods {
                        modules.insert(m.clone());
                    }
                    for (a, b) in &file_edges {
                        *fanout.entry(a.clone()).or_insert(0) += 1;
                        edges.push((a.clone(), b.clone()));
                    }
                    dead_exports.extend(rust_dead_exports(&package));
                }
                other => {
                    let loaded = ts_parser.load_all(target)?;
                    let (mods, file_edges) = treesitter_module_graph(other, &loaded);
                    for m in &mods {
                        modules.insert(m.clone());
                    }
                    for (a, b) in &file_edges {
                        *fanout.entry(a.clone()).or_insert(0) += 1;
                        edges.push((a.clone(), b.clone()));
                    }
                }
            }
        }

        let module_list: Vec<String> = modules.into_iter().collect();
        let circular_dependencies = find_cycles(&module_list, &edges);

        let avg_module_fanout = if fanout.is_empty() {
            0.0
        } else {
            fanout.values().sum::<u32>() as f64 / fanout.len() as f64
        };
        let import_complexity = if module_list.is_empty() {
            0.0
        } else {
            edges.len() as f64 / module_list.len() as f64
        };

        dead_exports.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));

        Ok(AnalysisResult {
            category: Category::C3Architecture,
            metrics: CategoryMetrics::C3(C3Metrics {
                max_directory_depth,
                avg_module_fanout,
                circular_dependencies,
                import_complexity,
                dead_exports,
            }),
        })
    }
}

fn rust_module_graph(package: &ParsedPackage) -> (Vec<String>, Vec<(String, String)>) {
    let module_names: HashSet<String> = package
        .files
        .iter()
        .filter_map(|f| f.rel_path.file_stem().map(|s| s.to_string_lossy().to_string()))
        .collect();

    let mut edges = Vec::new();
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
                        edges.push((this_module.clone(), target));
                    }
                }
            }
        }
    }
    (module_names.into_iter().collect(), edges)
}

fn use_tree_first_segments(tree: &syn::UseTree) -> Vec<String> {
    match tree {
        syn::UseTree::Path(p) => vec![p.ident.to_string()],
        syn::UseTree::Group(g) => g.items.iter().flat_map(use_tree_first_segments).collect(),
        syn::UseTree::Name(n) => vec![n.ident.to_string()],
        _ => Vec::new(),
    }
}

fn treesitter_module_graph(
    language: Language,
    files: &[(crate::parser::ParsedTreeSitterFile, crate::parser::TreeGuard)],
) -> (Vec<String>, Vec<(String, String)>) {
    let module_names: HashSet<String> = files
        .iter()
        .filter_map(|(f, _)| f.rel_path.file_stem().map(|s| s.to_string_lossy().to_string()))
        .collect();

    let mut edges = Vec::new();
    for (file, guard) in files {
        let this_module = file
            .rel_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let root = guard.root_node();
        let mut cursor = root.walk();
        collect_import_targets(language, &root, &guard.content, &mut cursor, &this_module, &module_names, &mut edges);
    }
    (module_names.into_iter().collect(), edges)
}

fn collect_import_targets(
    language: Language,
    node: &tree_sitter::Node,
    source: &str,
    cursor: &mut tree_sitter::TreeCursor,
    this_module: &str,
    module_names: &HashSet<String>,
    edges: &mut Vec<(String, String)>,
) {
    let is_import = matches!(
        node.kind(),
        "import_statement" | "import_from_statement" | "export_statement"
    );
    if is_import {
        if let Ok(text) = node.utf8_text(source.as_bytes()) {
            for module in module_names {
                if module != this_module && text.contains(module.as_str()) {
                    edges.push((this_module.to_string(), module.clone()));
                }
            }
        }
    }
    let _ = language;
    if cursor.goto_first_child() {
        loop {
            collect_import_targets(language, &cursor.node(), source, cursor, this_module, module_names, edges);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
}

/// Exported (`pub`) items whose name appears in no other in-module file as
/// a reference (conservative: literal identifier scan, see
/// `parser::rust_parser::build_type_universe`); entry points are never
/// flagged.
fn rust_dead_exports(package: &ParsedPackage) -> Vec<DeadExport> {
    const ENTRY_POINTS: &[&str] = &["main"];
    package
        .type_universe
        .items
        .iter()
        .filter(|item| item.is_pub)
        .filter(|item| !ENTRY_POINTS.contains(&item.name.as_str()))
        .filter(|item| !item.name.starts_with("Test") && !item.name.starts_with("Example"))
        .filter(|item| {
            package
                .type_universe
                .references
                .get(&item.name)
                .map(|files| files.is_empty())
                .unwrap_or(true)
        })
        .map(|item| DeadExport {
            file: item.file.clone(),
            line: item.line,
            symbol: item.name.clone(),
        })
        .collect()
}

/// Tri-color DFS cycle detection over an opaque-index graph built with
/// `petgraph` (`spec.md` §9). Each cycle is reported as its minimal
/// lexicographic rotation; duplicate rotations of the same cycle are
/// deduplicated; the overall list is ordered by starting node.
fn find_cycles(modules: &[String], raw_edges: &[(String, String)]) -> Vec<Vec<String>> {
    let mut sorted_modules = modules.to_vec();
    sorted_modules.sort();

    let mut graph = DiGraph::<String, ()>::new();
    let mut idx: HashMap<String, NodeIndex> = HashMap::new();
    for m in &sorted_modules {
        let n = graph.add_node(m.clone());
        idx.insert(m.clone(), n);
    }
    for (a, b) in raw_edges {
        if let (Some(&ai), Some(&bi)) = (idx.get(a), idx.get(b)) {
            if ai != bi {
                graph.update_edge(ai, bi, ());
            }
        }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let mut color = vec![Color::White; graph.node_count()];
    let mut stack: Vec<NodeIndex> = Vec::new();
    let mut seen_canonical: HashSet<Vec<usize>> = HashSet::new();
    let mut cycles: Vec<Vec<String>> = Vec::new();

    fn dfs(
        node: NodeIndex,
        graph: &DiGraph<String, ()>,
        color: &mut [Color],
        stack: &mut Vec<NodeIndex>,
        seen_canonical: &mut HashSet<Vec<usize>>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        color[node.index()] = Color::Gray;
        stack.push(node);

        let mut neighbors: Vec<NodeIndex> = graph.neighbors(node).collect();
        neighbors.sort_by(|a, b| graph[*a].cmp(&graph[*b]));

        for next in neighbors {
            match color[next.index()] {
                Color::White => dfs(next, graph, color, stack, seen_canonical, cycles),
                Color::Gray => {
                    if let Some(pos) = stack.iter().position(|&n| n == next) {
                        let cycle_nodes = stack[pos..].to_vec();
                        let canonical = canonical_rotation(&cycle_nodes, graph);
                        let key: Vec<usize> = canonical.iter().map(|n| n.index()).collect();
                        if seen_canonical.insert(key) {
                            cycles.push(canonical.iter().map(|n| graph[*n].clone()).collect());
                        }
                    }
                }
                Color::Black => {}
            }
        }

        stack.pop();
        color[node.index()] = Color::Black;
    }

    for m in &sorted_modules {
        let start = idx[m];
        if color[start.index()] == Color::White {
            dfs(start, &graph, &mut color, &mut stack, &mut seen_canonical, &mut cycles);
        }
    }

    cycles.sort_by(|a, b| a.first().cmp(&b.first()));
    cycles
}

fn canonical_rotation(nodes: &[NodeIndex], graph: &DiGraph<String, ()>) -> Vec<NodeIndex> {
    let min_pos = nodes
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| graph[**a].cmp(&graph[**b]))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let mut rotated = nodes[min_pos..].to_vec();
    rotated.extend_from_slice(&nodes[..min_pos]);
    rotated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_node_cycle_is_detected_with_least_rotation() {
        let modules = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let edges = vec![
            ("a".to_string(), "b".to_string()),
            ("b".to_string(), "c".to_string()),
            ("c".to_string(), "a".to_string()),
        ];
        let cycles = find_cycles(&modules, &edges);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0], vec!["a", "b", "c"]);
    }

    #[test]
    fn acyclic_graph_reports_no_cycles() {
        let modules = vec!["a".to_string(), "b".to_string()];
        let edges = vec![("a".to_string(), "b".to_string())];
        assert!(find_cycles(&modules, &edges).is_empty());
    }
}
