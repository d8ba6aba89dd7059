//! Tree-sitter parser for Python, JavaScript and TypeScript.
//!
//! Parsed trees own native (C-allocated) memory. `TreeGuard` is the scoped
//! release primitive from `spec.md` §3/§9: it owns the `tree_sitter::Tree`
//! and the byte content it was parsed from, and drops both together so a
//! tree is never read after its backing buffer is freed.

use crate::core::Language;
use crate::errors::AgentReadinessError;
use once_cell::sync::Lazy;
use std::path::PathBuf;

/// Process-wide memoized grammar pointers, built once at first use. This is
/// the one allowed piece of global state per `spec.md` §5.
static PYTHON_LANG: Lazy<tree_sitter::Language> = Lazy::new(|| tree_sitter_python::LANGUAGE.into());
static JAVASCRIPT_LANG: Lazy<tree_sitter::Language> =
    Lazy::new(|| tree_sitter_javascript::LANGUAGE.into());
static TYPESCRIPT_LANG: Lazy<tree_sitter::Language> =
    Lazy::new(|| tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into());
static TSX_LANG: Lazy<tree_sitter::Language> = Lazy::new(|| tree_sitter_typescript::LANGUAGE_TSX.into());

fn grammar_for(language: Language, rel_path: &std::path::Path) -> tree_sitter::Language {
    match language {
        Language::Python => PYTHON_LANG.clone(),
        Language::JavaScript => JAVASCRIPT_LANG.clone(),
        Language::TypeScript => {
            if rel_path.extension().and_then(|e| e.to_str()) == Some("tsx") {
                TSX_LANG.clone()
            } else {
                TYPESCRIPT_LANG.clone()
            }
        }
        Language::Rust => unreachable!("rust is handled by the type-aware parser"),
    }
}

/// An owned, scoped tree: the byte content lives as long as the tree, and
/// both are released together when this value is dropped.
pub struct TreeGuard {
    pub tree: tree_sitter::Tree,
    pub content: String,
}

impl TreeGuard {
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }
}

#[derive(Debug, Clone)]
pub struct ParsedTreeSitterFile {
    pub path: PathBuf,
    pub rel_path: PathBuf,
    pub language: Language,
    pub is_test: bool,
}

#[derive(Default)]
pub struct TreeSitterParser;

impl TreeSitterParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse one file's content, returning the scoped tree guard alongside
    /// the file's identity. A parse failure for a single file is non-fatal:
    /// callers skip the file and continue (`spec.md` §4.1).
    pub fn parse(
        &self,
        src: &crate::core::SourceFile,
    ) -> Result<(ParsedTreeSitterFile, TreeGuard), AgentReadinessError> {
        let content = std::fs::read_to_string(&src.path)
            .map_err(|e| AgentReadinessError::io(e.to_string(), Some(src.path.clone())))?;

        let mut parser = tree_sitter::Parser::new();
        let grammar = grammar_for(src.language, &src.rel_path);
        parser
            .set_language(&grammar)
            .map_err(|e| AgentReadinessError::analysis(format!("unsupported grammar: {e}")))?;

        let tree = parser.parse(&content, None).ok_or_else(|| {
            AgentReadinessError::parse_load("tree-sitter returned no tree", "treesitter", src.path.clone())
        })?;

        if tree.root_node().has_error() {
            tracing::debug!(file = %src.path.display(), "tree-sitter parse has error nodes, proceeding best-effort");
        }

        let file = ParsedTreeSitterFile {
            path: src.path.clone(),
            rel_path: src.rel_path.clone(),
            language: src.language,
            is_test: src.class == crate::core::FileClass::Test,
        };
        Ok((file, TreeGuard { tree, content }))
    }

    /// Parse every file in a target, skipping individual parse failures. If
    /// every file fails, returns an error (whole-load failure).
    pub fn load_all(
        &self,
        target: &crate::core::AnalysisTarget,
    ) -> Result<Vec<(ParsedTreeSitterFile, TreeGuard)>, AgentReadinessError> {
        let mut parsed = Vec::new();
        let mut failures = 0usize;
        for src in &target.files {
            match self.parse(src) {
                Ok(pair) => parsed.push(pair),
                Err(e) => {
                    tracing::warn!(file = %src.path.display(), error = %e, "skipping file with parse error");
                    failures += 1;
                }
            }
        }
        if parsed.is_empty() && failures > 0 {
            return Err(AgentReadinessError::parse_load(
                format!("all {failures} files failed to parse"),
                target.language.display_name(),
                target.root_dir.clone(),
            ));
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FileClass, SourceFile};

    #[test]
    fn parses_python_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mod.py");
        std::fs::write(&path, "def f(x):\n    return x + 1\n").unwrap();
        let src = SourceFile {
            path: path.clone(),
            rel_path: "mod.py".into(),
            language: Language::Python,
            class: FileClass::Source,
        };
        let parser = TreeSitterParser::new();
        let (file, guard) = parser.parse(&src).unwrap();
        assert_eq!(file.language, Language::Python);
        assert!(!guard.root_node().has_error());
    }

    #[test]
    fn single_failed_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let ok_path = dir.path().join("a.py");
        std::fs::write(&ok_path, "x = 1\n").unwrap();
        let missing_path = dir.path().join("missing.py");
        let target = crate::core::AnalysisTarget {
            language: Language::Python,
            root_dir: dir.path().to_path_buf(),
            files: vec![
                SourceFile {
                    path: ok_path,
                    rel_path: "a.py".into(),
                    language: Language::Python,
                    class: FileClass::Source,
                },
                SourceFile {
                    path: missing_path,
                    rel_path: "missing.py".into(),
                    language: Language::Python,
                    class: FileClass::Source,
                },
            ],
        };
        let parser = TreeSitterParser::new();
        let loaded = parser.load_all(&target).unwrap();
        assert_eq!(loaded.len(), 1);
    }
}
