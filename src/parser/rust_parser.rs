//! Type-aware parser for the primary statically-typed language.
//!
//! This is deliberately not a full borrow/type checker — it parses each
//! file with `syn` (syntax), indexes declared items into a `TypeUniverse`
//! (a lightweight stand-in for "type info"), and resolves call-site
//! identifiers to declarations within the same package where unambiguous.
//! Requesting type info without syntax is a programming error: the two are
//! produced together by `RustParser::load`.

use crate::core::{AnalysisTarget, SourceFile};
use crate::errors::AgentReadinessError;
use std::collections::HashMap;
use std::path::PathBuf;

/// One parsed Rust file: its `syn::File` AST plus the raw source (needed
/// for token-position arithmetic via `proc_macro2::Span` line/column
/// info, which requires the original text to convert byte offsets).
#[derive(Debug, Clone)]
pub struct ParsedRustFile {
    pub path: PathBuf,
    pub rel_path: PathBuf,
    pub source: String,
    pub ast: syn::File,
    pub is_test: bool,
}

/// A declared item in the type universe: enough to answer "is this exported
/// symbol used anywhere" (C3 dead-export detection) and "what does this
/// identifier refer to" (C7 M4 sampling) without a full type checker.
#[derive(Debug, Clone)]
pub struct DeclaredItem {
    pub name: String,
    pub file: PathBuf,
    pub line: usize,
    pub is_pub: bool,
    pub kind: DeclaredItemKind,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredItemKind {
    Function,
    Struct,
    Enum,
    Trait,
    Const,
    Module,
}

/// Resolved type/identifier universe for one package: every declared item,
/// plus a reverse index from item name to the files that reference it
/// (the closest thing to "type-resolved identifier info" this analyzer
/// needs downstream).
#[derive(Debug, Clone, Default)]
pub struct TypeUniverse {
    pub items: Vec<DeclaredItem>,
    /// name -> set of files containing a token matching that name, used by
    /// C3's conservative dead-export heuristic.
    pub references: HashMap<String, Vec<PathBuf>>,
}

/// One package: a directory's worth of Rust files sharing a package path
/// (here, the `AnalysisTarget::root_dir`), its parsed file list, and its
/// resolved type universe.
#[derive(Debug, Clone)]
pub struct ParsedPackage {
    pub package_path: String,
    pub files: Vec<ParsedRustFile>,
    pub type_universe: TypeUniverse,
}

#[derive(Debug, Default)]
pub struct RustParser;

impl RustParser {
    pub fn new() -> Self {
        Self
    }

    /// Load every Rust file in `target`, deduplicating external-test
    /// package variants by package path (here: one package per
    /// `AnalysisTarget`). A single file that fails to parse is skipped
    /// (non-fatal); if every file fails, the whole load is an error.
    pub fn load(&self, target: &AnalysisTarget) -> Result<ParsedPackage, AgentReadinessError> {
        let mut files = Vec::new();
        let mut parse_failures = 0usize;

        for src in &target.files {
            match self.parse_file(src) {
                Ok(parsed) => files.push(parsed),
                Err(e) => {
                    tracing::warn!(file = %src.path.display(), error = %e, "skipping file with parse error");
                    parse_failures += 1;
                }
            }
        }

        if files.is_empty() && parse_failures > 0 {
            return Err(AgentReadinessError::parse_load(
                format!("all {} Rust files failed to parse", parse_failures),
                "rust",
                target.root_dir.clone(),
            ));
        }

        let type_universe = build_type_universe(&files);

        Ok(ParsedPackage {
            package_path: target.root_dir.display().to_string(),
            files,
            type_universe,
        })
    }

    fn parse_file(&self, src: &SourceFile) -> Result<ParsedRustFile, AgentReadinessError> {
        let source = std::fs::read_to_string(&src.path)
            .map_err(|e| AgentReadinessError::io(e.to_string(), Some(src.path.clone())))?;
        let ast = syn::parse_file(&source).map_err(|e| {
            AgentReadinessError::parse_load(e.to_string(), "rust", src.path.clone())
        })?;
        Ok(ParsedRustFile {
            path: src.path.clone(),
            rel_path: src.rel_path.clone(),
            source,
            ast,
            is_test: src.class == crate::core::FileClass::Test,
        })
    }
}

/// Requesting type/identifier info without syntax is a contract violation
/// in this design (the two are always produced together by `load`); this
/// helper documents and enforces that at the one call site that would
/// otherwise need to special-case it.
pub fn require_syntax_and_types<'a>(
    package: &'a ParsedPackage,
) -> Result<(&'a [ParsedRustFile], &'a TypeUniverse), AgentReadinessError> {
    if package.files.is_empty() {
        return Err(AgentReadinessError::analysis(
            "requested type info without any parsed syntax",
        ));
    }
    Ok((&package.files, &package.type_universe))
}

fn build_type_universe(files: &[ParsedRustFile]) -> TypeUniverse {
    let mut universe = TypeUniverse::default();

    for file in files {
        for item in &file.ast.items {
            if let Some(decl) = declared_item_from(item, &file.path) {
                universe.items.push(decl);
            }
        }
    }

    // Reverse index: for each declared item name, record every file whose
    // source text contains that identifier as a whole word (used, not
    // declaration). This is conservative by construction: it can produce
    // false "is used" positives on name collisions, which only makes the
    // C3 dead-export heuristic more conservative, never less.
    for file in files {
        for decl in &universe.items {
            if file.path != decl.file && contains_word(&file.source, &decl.name) {
                universe
                    .references
                    .entry(decl.name.clone())
                    .or_default()
                    .push(file.path.clone());
            }
        }
    }

    universe
}

fn contains_word(haystack: &str, word: &str) -> bool {
    let mut start = 0;
    while let Some(idx) = haystack[start..].find(word) {
        let abs = start + idx;
        let before_ok = abs == 0
            || !haystack.as_bytes()[abs - 1].is_ascii_alphanumeric()
                && haystack.as_bytes()[abs - 1] != b'_';
        let after = abs + word.len();
        let after_ok = after >= haystack.len()
            || !haystack.as_bytes()[after].is_ascii_alphanumeric() && haystack.as_bytes()[after] != b'_';
        if before_ok && after_ok {
            return true;
        }
        start = abs + 1;
        if start >= haystack.len() {
            break;
        }
    }
    false
}

fn declared_item_from(item: &syn::Item, path: &std::path::Path) -> Option<DeclaredItem> {
    use syn::Item;
    let (name, is_pub, kind, line, doc) = match item {
        Item::Fn(f) => (
            f.sig.ident.to_string(),
            matches!(f.vis, syn::Visibility::Public(_)),
            DeclaredItemKind::Function,
            line_of(&f.sig.ident),
            doc_comment(&f.attrs),
        ),
        Item::Struct(s) => (
            s.ident.to_string(),
            matches!(s.vis, syn::Visibility::Public(_)),
            DeclaredItemKind::Struct,
            line_of(&s.ident),
            doc_comment(&s.attrs),
        ),
        Item::Enum(e) => (
            e.ident.to_string(),
            matches!(e.vis, syn::Visibility::Public(_)),
            DeclaredItemKind::Enum,
            line_of(&e.ident),
            doc_comment(&e.attrs),
        ),
        Item::Trait(t) => (
            t.ident.to_string(),
            matches!(t.vis, syn::Visibility::Public(_)),
            DeclaredItemKind::Trait,
            line_of(&t.ident),
            doc_comment(&t.attrs),
        ),
        Item::Const(c) => (
            c.ident.to_string(),
            matches!(c.vis, syn::Visibility::Public(_)),
            DeclaredItemKind::Const,
            line_of(&c.ident),
            doc_comment(&c.attrs),
        ),
        Item::Mod(m) => (
            m.ident.to_string(),
            matches!(m.vis, syn::Visibility::Public(_)),
            DeclaredItemKind::Module,
            line_of(&m.ident),
            doc_comment(&m.attrs),
        ),
        _ => return None,
    };

    Some(DeclaredItem {
        name,
        file: path.to_path_buf(),
        line,
        is_pub,
        kind,
        doc,
    })
}

fn line_of(ident: &syn::Ident) -> usize {
    ident.span().start().line
}

fn doc_comment(attrs: &[syn::Attribute]) -> Option<String> {
    let mut lines = Vec::new();
    for attr in attrs {
        if attr.path().is_ident("doc") {
            if let syn::Meta::NameValue(nv) = &attr.meta {
                if let syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) = &nv.value
                {
                    lines.push(s.value().trim().to_string());
                }
            }
        }
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FileClass, Language};

    fn target_from_sources(dir: &std::path::Path, files: &[(&str, &str)]) -> AnalysisTarget {
        let mut sources = Vec::new();
        for (name, content) in files {
            let path = dir.join(name);
            std::fs::write(&path, content).unwrap();
            sources.push(SourceFile {
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
    fn load_indexes_declared_items() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_from_sources(
            dir.path(),
            &[(
                "lib.rs",
                "/// does a thing\npub fn do_thing() {}\nstruct Hidden;\n",
            )],
        );
        let parser = RustParser::new();
        let package = parser.load(&target).unwrap();
        assert_eq!(package.type_universe.items.len(), 2);
        let func = package
            .type_universe
            .items
            .iter()
            .find(|i| i.name == "do_thing")
            .unwrap();
        assert!(func.is_pub);
        assert_eq!(func.doc.as_deref(), Some("does a thing"));
    }

    #[test]
    fn single_file_parse_error_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_from_sources(
            dir.path(),
            &[
                ("good.rs", "pub fn ok() {}\n"),
                ("bad.rs", "this is not valid rust {{{\n"),
            ],
        );
        let parser = RustParser::new();
        let package = parser.load(&target).unwrap();
        assert_eq!(package.files.len(), 1);
    }

    #[test]
    fn all_files_failing_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = target_from_sources(dir.path(), &[("bad.rs", "not valid {{{\n")]);
        let parser = RustParser::new();
        assert!(parser.load(&target).is_err());
    }
}
