//! Shared data model: analysis targets, source files, and the closed
//! language set the rest of the pipeline dispatches on.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The closed set of languages this analyzer understands.
///
/// Rust is the primary statically-typed language (parsed by the type-aware
/// `syn`-based parser); the rest go through the tree-sitter parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
}

impl Language {
    pub fn is_type_aware(&self) -> bool {
        matches!(self, Language::Rust)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Rust => "Rust",
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
        }
    }

    /// Detect a language from a file extension. Returns `None` for
    /// extensions outside the closed set (the caller skips such files).
    pub fn from_extension(ext: &str) -> Option<Language> {
        match ext {
            "rs" => Some(Language::Rust),
            "py" | "pyi" => Some(Language::Python),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" | "tsx" => Some(Language::TypeScript),
            _ => None,
        }
    }
}

/// Whether a source file is production code or a test file, per the
/// language-specific path convention (see `analyzers::c6_testing`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileClass {
    Source,
    Test,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to `AnalysisTarget::root_dir`, used for evidence and
    /// report display.
    pub rel_path: PathBuf,
    pub language: Language,
    pub class: FileClass,
}

/// One per detected language root. Created by discovery (out of this
/// crate's scope) and immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisTarget {
    pub language: Language,
    pub root_dir: PathBuf,
    pub files: Vec<SourceFile>,
}

impl AnalysisTarget {
    pub fn source_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().filter(|f| f.class == FileClass::Source)
    }

    pub fn test_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().filter(|f| f.class == FileClass::Test)
    }
}

/// A minimal single-target discovery helper. Full filesystem discovery and
/// project-root detection is an external collaborator (see `spec.md` §1);
/// this walks a single root and classifies files by extension and a small
/// set of test-path conventions so the crate is runnable standalone.
pub mod discovery {
    use super::*;
    use ignore::WalkBuilder;
    use std::collections::BTreeMap;

    fn is_test_path(language: Language, rel: &std::path::Path) -> bool {
        let s = rel.to_string_lossy();
        match language {
            Language::Rust => {
                s.contains("/tests/") || s.starts_with("tests/") || s.ends_with("_test.rs")
            }
            Language::Python => {
                let file_name = rel
                    .file_name()
                    .map(|f| f.to_string_lossy().to_string())
                    .unwrap_or_default();
                s.contains("/tests/")
                    || s.starts_with("tests/")
                    || file_name.starts_with("test_")
                    || file_name.ends_with("_test.py")
            }
            Language::JavaScript | Language::TypeScript => {
                let file_name = rel
                    .file_name()
                    .map(|f| f.to_string_lossy().to_string())
                    .unwrap_or_default();
                s.contains("/test/")
                    || s.contains("/tests/")
                    || s.contains("/__tests__/")
                    || file_name.contains(".test.")
                    || file_name.contains(".spec.")
            }
        }
    }

    /// Walk `root` and bucket files into one `AnalysisTarget` per detected
    /// language, respecting `.gitignore`.
    pub fn discover(root: &std::path::Path) -> Vec<AnalysisTarget> {
        let mut by_language: BTreeMap<Language, Vec<SourceFile>> = BTreeMap::new();

        for entry in WalkBuilder::new(root).hidden(false).build().flatten() {
            let path = entry.path();
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            let Some(language) = Language::from_extension(ext) else {
                continue;
            };
            let rel_path = path.strip_prefix(root).unwrap_or(path).to_path_buf();
            let class = if is_test_path(language, &rel_path) {
                FileClass::Test
            } else {
                FileClass::Source
            };
            by_language.entry(language).or_default().push(SourceFile {
                path: path.to_path_buf(),
                rel_path,
                language,
                class,
            });
        }

        by_language
            .into_iter()
            .map(|(language, mut files)| {
                files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
                AnalysisTarget {
                    language,
                    root_dir: root.to_path_buf(),
                    files,
                }
            })
            .collect()
    }
}

impl PartialOrd for Language {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Language {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        fn rank(l: &Language) -> u8 {
            match l {
                Language::Rust => 0,
                Language::Python => 1,
                Language::JavaScript => 2,
                Language::TypeScript => 3,
            }
        }
        rank(self).cmp(&rank(other))
    }
}
