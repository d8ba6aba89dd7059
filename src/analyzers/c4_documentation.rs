//! C4 Documentation: README size, comment density, public API doc
//! coverage, and presence flags for CHANGELOG/examples/CONTRIBUTING/
//! diagrams (`spec.md` §4.2).

use crate::analyzers::CategoryAnalyzer;
use crate::core::{AnalysisTarget, Language};
use crate::errors::AgentReadinessError;
use crate::metrics::{AnalysisResult, C4Metrics, Category, CategoryMetrics, DeadExport};
use crate::parser::{RustParser, TreeSitterParser};
use std::path::Path;

pub struct C4Analyzer;

impl CategoryAnalyzer for C4Analyzer {
    fn analyze(&self, targets: &[AnalysisTarget]) -> Result<AnalysisResult, AgentReadinessError> {
        let root_dir = targets
            .first()
            .map(|t| t.root_dir.clone())
            .unwrap_or_default();

        let readme_word_count = find_readme(&root_dir)
            .map(|content| content.split_whitespace().count())
            .unwrap_or(0);
        let has_changelog = repo_file_exists(&root_dir, &["CHANGELOG.md", "CHANGELOG", "CHANGELOG.rst"]);
        let has_contributing = repo_file_exists(&root_dir, &["CONTRIBUTING.md", "CONTRIBUTING"]);
        let has_examples = root_dir.join("demos").is_dir() || root_dir.join("examples").is_dir();
        let has_diagrams = find_readme(&root_dir)
            .map(|c| c.contains("```mermaid") || c.contains(".svg") || c.contains(".png"))
            .unwrap_or(false);

        let rust_parser = RustParser::new();
        let ts_parser = TreeSitterParser::new();

        let mut total_lines = 0usize;
        let mut comment_lines = 0usize;
        let mut public_items = 0usize;
        let mut documented_items = 0usize;
        let mut undocumented_public_items: Vec<DeadExport> = Vec::new();

        for target in targets {
            match target.language {
                Language::Rust => {
                    let package = rust_parser.load(target)?;
                    for file in &package.files {
                        total_lines += file.source.lines().count();
                        comment_lines += count_rust_comment_lines(&file.source);
                    }
                    for item in &package.type_universe.items {
                        if item.is_pub {
                            public_items += 1;
                            if item.doc.is_some() {
                                documented_items += 1;
                            } else {
                                undocumented_public_items.push(DeadExport {
                                    file: item.file.clone(),
                                    line: item.line,
                                    symbol: item.name.clone(),
                                });
                            }
                        }
                    }
                }
                other => {
                    let loaded = ts_parser.load_all(target)?;
                    for (file, guard) in &loaded {
                        total_lines += guard.content.lines().count();
                        comment_lines += count_treesitter_comment_lines(&guard.root_node());
                        let root = guard.root_node();
                        let mut cursor = root.walk();
                        collect_exported_docs(
                            other,
                            &mut cursor,
                            &guard.content,
                            &file.rel_path,
                            &mut public_items,
                            &mut documented_items,
                            &mut undocumented_public_items,
                        );
                    }
                }
            }
        }

        let comment_density = if total_lines == 0 {
            0.0
        } else {
            comment_lines as f64 / total_lines as f64 * 100.0
        };
        let api_doc_coverage = if public_items == 0 {
            100.0
        } else {
            documented_items as f64 / public_items as f64 * 100.0
        };

        undocumented_public_items.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));
        undocumented_public_items.truncate(5);

        Ok(AnalysisResult {
            category: Category::C4Documentation,
            metrics: CategoryMetrics::C4(C4Metrics {
                readme_word_count,
                comment_density,
                api_doc_coverage,
                has_changelog,
                has_examples,
                has_contributing,
                has_diagrams,
                undocumented_public_items,
            }),
        })
    }
}

fn find_readme(root_dir: &Path) -> Option<String> {
    for name in ["README.md", "Readme.md", "README", "README.rst", "README.txt"] {
        let path = root_dir.join(name);
        if let Ok(content) = std::fs::read_to_string(&path) {
            return Some(content);
        }
    }
    None
}

fn repo_file_exists(root_dir: &Path, names: &[&str]) -> bool {
    names.iter().any(|n| root_dir.join(n).is_file())
}

fn count_rust_comment_lines(source: &str) -> usize {
    source
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*')
        })
        .count()
}

fn count_treesitter_comment_lines(root: &tree_sitter::Node) -> usize {
    let mut count = 0usize;
    let mut cursor = root.walk();
    count_comment_nodes(&mut cursor, &mut count);
    count
}

fn count_comment_nodes(cursor: &mut tree_sitter::TreeCursor, count: &mut usize) {
    if cursor.node().kind() == "comment" {
        *count += 1 + cursor.node().start_position().row.abs_diff(cursor.node().end_position().row);
    }
    if cursor.goto_first_child() {
        loop {
            count_comment_nodes(cursor, count);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
}

/// Exported (non-underscore-prefixed top-level) function/class definitions
/// preceded by a doc comment or docstring. Only module-level declarations
/// are considered; nested helpers are not part of the public surface.
fn collect_exported_docs(
    language: Language,
    cursor: &mut tree_sitter::TreeCursor,
    source: &str,
    rel_path: &Path,
    public_items: &mut usize,
    documented_items: &mut usize,
    undocumented: &mut Vec<DeadExport>,
) {
    let node = cursor.node();
    let is_decl = matches!(
        node.kind(),
        "function_definition" | "function_declaration" | "class_definition" | "class_declaration"
    );
    if is_decl {
        if let Some(name_node) = node.child_by_field_name("name") {
            if let Ok(name) = name_node.utf8_text(source.as_bytes()) {
                let is_exported = match language {
                    Language::Python => !name.starts_with('_'),
                    _ => true,
                };
                if is_exported {
                    *public_items += 1;
                    if has_preceding_doc(&node, language, source) {
                        *documented_items += 1;
                    } else {
                        undocumented.push(DeadExport {
                            file: rel_path.to_path_buf(),
                            line: node.start_position().row + 1,
                            symbol: name.to_string(),
                        });
                    }
                }
            }
        }
    }
    if cursor.goto_first_child() {
        loop {
            collect_exported_docs(
                language,
                cursor,
                source,
                rel_path,
                public_items,
                documented_items,
                undocumented,
            );
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
}

fn has_preceding_doc(node: &tree_sitter::Node, language: Language, source: &str) -> bool {
    match language {
        Language::Python => node
            .child_by_field_name("body")
            .and_then(|body| body.child(0))
            .map(|first| first.kind() == "expression_statement" && first.utf8_text(source.as_bytes()).is_ok())
            .unwrap_or(false)
            && node
                .child_by_field_name("body")
                .and_then(|b| b.child(0))
                .and_then(|s| s.child(0))
                .map(|n| n.kind() == "string")
                .unwrap_or(false),
        _ => node
            .prev_sibling()
            .map(|sib| sib.kind() == "comment")
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_readme_reports_zero_word_count() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_readme(dir.path()), None);
    }

    #[test]
    fn counts_line_comments() {
        let src = "// a\nfn f() {}\n// b\n";
        assert_eq!(count_rust_comment_lines(src), 2);
    }
}
