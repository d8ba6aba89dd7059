//! C6 Testing: test-to-code ratio, assertion density, and a test-isolation
//! heuristic (`spec.md` §4.2). Coverage percentage/source are left unset
//! here and filled in by `coverage::merge_into` from an external report,
//! since this analyzer only sees parsed source, not a coverage file path.

use crate::analyzers::CategoryAnalyzer;
use crate::core::{AnalysisTarget, Language};
use crate::errors::AgentReadinessError;
use crate::metrics::{AnalysisResult, C6Metrics, Category, CategoryMetrics, TestFunctionRecord};
use crate::parser::{RustParser, TreeSitterParser};
use std::path::Path;

pub struct C6Analyzer;

/// File-level blocklist of networking/DB-driver/subprocess modules
/// (`spec.md` §4.2: "a test file is 'non-isolated' if it imports any
/// module from a closed blocklist"). Matched against the first segment of
/// each `use`/`import` path, so `tokio::net::TcpStream` and `std::net::*`
/// both match on `net`.
const RUST_BLOCKLIST: &[&str] = &["net", "reqwest", "hyper", "rusqlite", "sqlx", "postgres", "diesel", "mysql_async", "redis"];
const PYTHON_BLOCKLIST: &[&str] = &["socket", "requests", "urllib", "http", "sqlite3", "psycopg2", "pymongo", "subprocess", "redis"];
const JS_BLOCKLIST: &[&str] = &["net", "http", "https", "child_process", "pg", "mysql", "mysql2", "mongodb", "redis", "sequelize"];

impl CategoryAnalyzer for C6Analyzer {
    fn analyze(&self, targets: &[AnalysisTarget]) -> Result<AnalysisResult, AgentReadinessError> {
        let mut tests: Vec<TestFunctionRecord> = Vec::new();
        let mut test_file_count = 0usize;
        let mut source_file_count = 0usize;

        let rust_parser = RustParser::new();
        let ts_parser = TreeSitterParser::new();

        for target in targets {
            match target.language {
                Language::Rust => {
                    let package = rust_parser.load(target)?;
                    for file in &package.files {
                        if file.is_test {
                            test_file_count += 1;
                        } else {
                            source_file_count += 1;
                        }
                        let isolated = !rust_file_imports_blocklisted(&file.ast);
                        for item in &file.ast.items {
                            collect_rust_tests(item, &file.rel_path, isolated, &mut tests);
                        }
                    }
                }
                other => {
                    let loaded = ts_parser.load_all(target)?;
                    for (file, guard) in &loaded {
                        if file.is_test {
                            test_file_count += 1;
                        } else {
                            source_file_count += 1;
                        }
                        if file.is_test {
                            let root = guard.root_node();
                            let isolated = !ts_file_imports_blocklisted(other, &root, &guard.content);
                            let mut cursor = root.walk();
                            collect_ts_tests(other, &mut cursor, &guard.content, &file.rel_path, isolated, &mut tests);
                        }
                    }
                }
            }
        }

        tests.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));

        let test_to_code_ratio = if source_file_count == 0 {
            0.0
        } else {
            test_file_count as f64 / source_file_count as f64
        };
        let avg_assertion_density = if tests.is_empty() {
            0.0
        } else {
            tests.iter().map(|t| t.assertion_count as f64).sum::<f64>() / tests.len() as f64
        };
        let test_isolation_pct = if tests.is_empty() {
            0.0
        } else {
            tests.iter().filter(|t| t.is_isolated).count() as f64 / tests.len() as f64 * 100.0
        };

        Ok(AnalysisResult {
            category: Category::C6Testing,
            metrics: CategoryMetrics::C6(C6Metrics {
                test_to_code_ratio,
                coverage_pct: None,
                coverage_source: None,
                test_isolation_pct,
                avg_assertion_density,
                test_file_count,
                source_file_count,
                tests,
            }),
        })
    }
}

fn collect_rust_tests(item: &syn::Item, rel_path: &Path, isolated: bool, out: &mut Vec<TestFunctionRecord>) {
    use syn::spanned::Spanned;
    match item {
        syn::Item::Fn(f) => {
            let is_test = f.attrs.iter().any(|a| a.path().is_ident("test"));
            if is_test {
                out.push(TestFunctionRecord {
                    file: rel_path.to_path_buf(),
                    name: f.sig.ident.to_string(),
                    line: f.sig.ident.span().start().line,
                    assertion_count: count_rust_assertions(&f.block),
                    is_isolated: isolated,
                });
            }
        }
        syn::Item::Mod(m) => {
            if let Some((_, items)) = &m.content {
                for it in items {
                    collect_rust_tests(it, rel_path, isolated, out);
                }
            }
        }
        _ => {}
    }
}

/// Whether `ast`'s `use` paths name anything in `RUST_BLOCKLIST` — checked
/// against every path segment, not just the first, so `std::net::TcpStream`
/// matches on `net` regardless of crate root naming.
fn rust_file_imports_blocklisted(ast: &syn::File) -> bool {
    fn segments(tree: &syn::UseTree, out: &mut Vec<String>) {
        match tree {
            syn::UseTree::Path(p) => {
                out.push(p.ident.to_string());
                segments(&p.tree, out);
            }
            syn::UseTree::Name(n) => out.push(n.ident.to_string()),
            syn::UseTree::Rename(r) => out.push(r.ident.to_string()),
            syn::UseTree::Group(g) => {
                for item in &g.items {
                    segments(item, out);
                }
            }
            syn::UseTree::Glob(_) => {}
        }
    }

    ast.items.iter().any(|item| {
        let syn::Item::Use(u) = item else { return false };
        let mut parts = Vec::new();
        segments(&u.tree, &mut parts);
        parts.iter().any(|p| RUST_BLOCKLIST.contains(&p.as_str()))
    })
}

const ASSERTION_MACROS: [&str; 5] = ["assert", "assert_eq", "assert_ne", "assert_matches", "panic"];

/// Counts assertion-macro invocations directly inside a test function's
/// body, deliberately excluding any nested function item the body
/// declares locally — a `fn helper() { assert!(...) }` defined inside a
/// test does not count as that test's own assertion.
struct AssertionCounter {
    count: usize,
}

impl<'ast> syn::visit::Visit<'ast> for AssertionCounter {
    fn visit_item(&mut self, _item: &'ast syn::Item) {
        // Don't recurse into nested items (fn/struct/impl/mod defined
        // locally inside the test body).
    }

    fn visit_macro(&mut self, mac: &'ast syn::Macro) {
        if mac.path.get_ident().is_some_and(|id| ASSERTION_MACROS.contains(&id.to_string().as_str())) {
            self.count += 1;
        }
        syn::visit::visit_macro(self, mac);
    }
}

fn count_rust_assertions(block: &syn::Block) -> usize {
    use syn::visit::Visit;
    let mut counter = AssertionCounter { count: 0 };
    counter.visit_block(block);
    counter.count
}

/// Whether any top-level `import`/`from ... import`/`require` in the file
/// names a module from the language's blocklist (`spec.md` §4.2).
fn ts_file_imports_blocklisted(language: Language, root: &tree_sitter::Node, source: &str) -> bool {
    let blocklist: &[&str] = match language {
        Language::Python => PYTHON_BLOCKLIST,
        _ => JS_BLOCKLIST,
    };
    let mut cursor = root.walk();
    scan_imports(&mut cursor, source, blocklist)
}

fn scan_imports(cursor: &mut tree_sitter::TreeCursor, source: &str, blocklist: &[&str]) -> bool {
    let node = cursor.node();
    let is_import_like = matches!(
        node.kind(),
        "import_statement" | "import_from_statement" | "call_expression"
    );
    if is_import_like {
        if let Ok(text) = node.utf8_text(source.as_bytes()) {
            let looks_like_require = node.kind() != "call_expression" || text.trim_start().starts_with("require(");
            if looks_like_require && blocklist.iter().any(|m| module_named_in(text, m)) {
                return true;
            }
        }
    }
    if cursor.goto_first_child() {
        loop {
            if scan_imports(cursor, source, blocklist) {
                cursor.goto_parent();
                return true;
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
    false
}

/// Whether import/require text names `module` as a whole path segment or
/// quoted specifier, not merely as a substring of an unrelated identifier.
fn module_named_in(text: &str, module: &str) -> bool {
    text.contains(&format!("'{module}'"))
        || text.contains(&format!("\"{module}\""))
        || text.contains(&format!("{module}."))
        || text.split(['.', ' ', ',', '(', ')']).any(|tok| tok == module)
}

fn collect_ts_tests(
    language: Language,
    cursor: &mut tree_sitter::TreeCursor,
    source: &str,
    rel_path: &Path,
    isolated: bool,
    out: &mut Vec<TestFunctionRecord>,
) {
    let node = cursor.node();
    let is_candidate = match language {
        Language::Python => node.kind() == "function_definition",
        _ => matches!(node.kind(), "call_expression"),
    };

    if is_candidate {
        match language {
            Language::Python => {
                if let Some(name_node) = node.child_by_field_name("name") {
                    if let Ok(name) = name_node.utf8_text(source.as_bytes()) {
                        if name.starts_with("test_") {
                            out.push(TestFunctionRecord {
                                file: rel_path.to_path_buf(),
                                name: name.to_string(),
                                line: node.start_position().row + 1,
                                assertion_count: count_ts_assertions(node, source),
                                is_isolated: isolated,
                            });
                        }
                    }
                }
            }
            _ => {
                if let Some(fn_name_node) = node.child_by_field_name("function") {
                    if let Ok(fn_name) = fn_name_node.utf8_text(source.as_bytes()) {
                        if matches!(fn_name, "it" | "test") {
                            if let Some(args) = node.child_by_field_name("arguments") {
                                let name = first_string_literal(&args, source).unwrap_or_else(|| "<anonymous>".to_string());
                                // The test's own body is the callback literal
                                // (`it("...", () => { ... })`), not the call
                                // expression itself — count from there so the
                                // top-level callback isn't mistaken for a
                                // "nested function definition" and excluded.
                                let callback = first_function_literal(&args).unwrap_or(node);
                                out.push(TestFunctionRecord {
                                    file: rel_path.to_path_buf(),
                                    name,
                                    line: node.start_position().row + 1,
                                    assertion_count: count_ts_assertions(callback, source),
                                    is_isolated: isolated,
                                });
                            }
                        }
                    }
                }
            }
        }
    }

    if cursor.goto_first_child() {
        loop {
            collect_ts_tests(language, cursor, source, rel_path, isolated, out);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
}

fn first_string_literal(node: &tree_sitter::Node, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "string" {
            return child.utf8_text(source.as_bytes()).ok().map(|s| s.trim_matches(['"', '\'']).to_string());
        }
    }
    None
}

/// The first function-literal argument in a call's argument list — the
/// callback passed to `it(name, fn)`/`test(name, fn)`.
fn first_function_literal<'t>(node: &tree_sitter::Node<'t>) -> Option<tree_sitter::Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .find(|c| matches!(c.kind(), "function_expression" | "arrow_function" | "function"))
}

const NESTED_FUNCTION_KINDS: [&str; 5] =
    ["function_definition", "function_declaration", "function_expression", "arrow_function", "method_definition"];

/// Assertion-pattern occurrences within `node`'s own text, deliberately
/// excluding any nested function definition's text — a helper declared
/// inside a test body doesn't contribute its assertions to that test.
fn count_ts_assertions(node: tree_sitter::Node, source: &str) -> usize {
    let mut excluded = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_nested_function_ranges(child, &mut excluded);
    }
    excluded.sort_unstable_by_key(|r| r.0);

    let bytes = source.as_bytes();
    let mut own_text = String::new();
    let mut pos = node.start_byte();
    for (start, end) in excluded {
        if start > pos {
            own_text.push_str(&String::from_utf8_lossy(&bytes[pos..start.min(node.end_byte())]));
        }
        pos = pos.max(end);
    }
    if pos < node.end_byte() {
        own_text.push_str(&String::from_utf8_lossy(&bytes[pos..node.end_byte()]));
    }

    ["assert(", "assert.", "expect(", "assertEqual", "assertTrue"]
        .iter()
        .map(|m| own_text.matches(m).count())
        .sum()
}

fn collect_nested_function_ranges(node: tree_sitter::Node, out: &mut Vec<(usize, usize)>) {
    if NESTED_FUNCTION_KINDS.contains(&node.kind()) {
        out.push((node.start_byte(), node.end_byte()));
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_nested_function_ranges(child, out);
    }
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

    fn js_target(dir: &std::path::Path, files: &[(&str, &str)]) -> AnalysisTarget {
        let mut sources = Vec::new();
        for (name, content) in files {
            let path = dir.join(name);
            std::fs::write(&path, content).unwrap();
            sources.push(crate::core::SourceFile {
                path: path.clone(),
                rel_path: std::path::PathBuf::from(format!("__tests__/{name}")),
                language: Language::JavaScript,
                class: FileClass::Test,
            });
        }
        AnalysisTarget {
            language: Language::JavaScript,
            root_dir: dir.to_path_buf(),
            files: sources,
        }
    }

    #[test]
    fn counts_rust_test_functions_and_assertions() {
        let dir = tempfile::tempdir().unwrap();
        let t = target(
            dir.path(),
            &[(
                "lib.rs",
                "fn prod() {}\n#[cfg(test)]\nmod tests {\n    #[test]\n    fn it_works() {\n        assert_eq!(1, 1);\n        assert!(true);\n    }\n}\n",
            )],
        );
        let result = C6Analyzer.analyze(&[t]).unwrap();
        let CategoryMetrics::C6(m) = result.metrics else {
            panic!()
        };
        assert_eq!(m.tests.len(), 1);
        assert_eq!(m.tests[0].assertion_count, 2);
        assert!(m.tests[0].is_isolated);
    }

    #[test]
    fn assertions_in_a_nested_fn_item_do_not_count_toward_the_test() {
        let dir = tempfile::tempdir().unwrap();
        let t = target(
            dir.path(),
            &[(
                "lib.rs",
                "#[cfg(test)]\nmod tests {\n    #[test]\n    fn it_works() {\n        fn helper() {\n            assert!(false);\n            assert!(false);\n        }\n        assert_eq!(1, 1);\n        helper();\n    }\n}\n",
            )],
        );
        let result = C6Analyzer.analyze(&[t]).unwrap();
        let CategoryMetrics::C6(m) = result.metrics else {
            panic!()
        };
        assert_eq!(m.tests[0].assertion_count, 1);
    }

    #[test]
    fn js_assertions_in_a_nested_helper_function_do_not_count_toward_the_test() {
        let dir = tempfile::tempdir().unwrap();
        let t = js_target(
            dir.path(),
            &[(
                "a.test.js",
                "it('works', () => {\n  function helper() {\n    expect(1).toBe(2);\n    expect(1).toBe(2);\n  }\n  expect(1).toBe(1);\n  helper();\n});\n",
            )],
        );
        let result = C6Analyzer.analyze(&[t]).unwrap();
        let CategoryMetrics::C6(m) = result.metrics else {
            panic!()
        };
        assert_eq!(m.tests.len(), 1);
        assert_eq!(m.tests[0].assertion_count, 1);
    }

    #[test]
    fn rust_test_file_importing_a_blocklisted_module_is_non_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let t = target(
            dir.path(),
            &[(
                "lib.rs",
                "use std::net::TcpStream;\n#[cfg(test)]\nmod tests {\n    #[test]\n    fn it_works() {\n        assert!(true);\n    }\n}\n",
            )],
        );
        let result = C6Analyzer.analyze(&[t]).unwrap();
        let CategoryMetrics::C6(m) = result.metrics else {
            panic!()
        };
        assert!(!m.tests[0].is_isolated);
    }

    #[test]
    fn js_test_file_requiring_child_process_is_non_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let t = js_target(
            dir.path(),
            &[(
                "a.test.js",
                "const cp = require('child_process');\nit('works', () => {\n  expect(1).toBe(1);\n});\n",
            )],
        );
        let result = C6Analyzer.analyze(&[t]).unwrap();
        let CategoryMetrics::C6(m) = result.metrics else {
            panic!()
        };
        assert!(!m.tests[0].is_isolated);
    }
}
