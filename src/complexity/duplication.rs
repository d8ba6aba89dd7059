//! Structural duplication detection: sliding windows of statement
//! sequences, hashed with identifier names normalized away.
//!
//! Minimum window per `spec.md` §4.2 is 6 lines / 3 statements (a window
//! must satisfy both). Groups with >= 2 occurrences are reported;
//! tie-breaking is deterministic by file order then line order.

use crate::metrics::DuplicateBlock;
use crate::parser::ParsedRustFile;
use quote::ToTokens;
use std::collections::HashMap;
use std::path::PathBuf;
use xxhash_rust::xxh64::xxh64;

const MIN_STATEMENTS: usize = 3;
const MIN_LINES: usize = 6;

/// A normalized statement: its rendered token stream with every
/// identifier replaced by a placeholder, so `let x = 1;` and `let y = 1;`
/// hash identically.
fn normalize_stmt(stmt: &syn::Stmt) -> String {
    let tokens = stmt.to_token_stream().to_string();
    // `to_string()` on a TokenStream renders idents verbatim; blank them
    // out token-by-token so renames don't defeat duplicate detection while
    // literals and keywords/punctuation (which carry the actual shape of
    // the statement) are preserved.
    tokens
        .split_whitespace()
        .map(|tok| {
            let is_ident = tok
                .chars()
                .next()
                .map(|c| c.is_alphabetic() || c == '_')
                .unwrap_or(false)
                && !is_rust_keyword(tok);
            if is_ident {
                "ID".to_string()
            } else {
                tok.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_rust_keyword(tok: &str) -> bool {
    matches!(
        tok,
        "let" | "if" | "else" | "match" | "for" | "while" | "loop" | "fn" | "return" | "mut"
            | "ref" | "struct" | "enum" | "impl" | "pub" | "use" | "mod" | "true" | "false"
            | "self" | "Self" | "break" | "continue" | "in" | "as" | "const" | "static"
    )
}

fn line_of_stmt(stmt: &syn::Stmt) -> usize {
    use syn::spanned::Spanned;
    stmt.span().start().line
}

/// Extract every (>= MIN_STATEMENTS, >= MIN_LINES) sliding window of
/// top-level statements from every block in a file, recursing into nested
/// blocks so duplication inside match arms / if bodies is also caught.
fn windows_in_file(file: &ParsedRustFile) -> Vec<(usize, String, usize)> {
    let mut blocks: Vec<&syn::Block> = Vec::new();
    collect_blocks(&file.ast, &mut blocks);

    let mut windows = Vec::new();
    for block in blocks {
        let stmts = &block.stmts;
        for window_len in MIN_STATEMENTS..=stmts.len().min(MIN_STATEMENTS + 20) {
            for start in 0..=stmts.len().saturating_sub(window_len) {
                let slice = &stmts[start..start + window_len];
                let first_line = line_of_stmt(&slice[0]);
                let last_line = line_of_stmt(&slice[slice.len() - 1]);
                if last_line.saturating_sub(first_line) + 1 < MIN_LINES {
                    continue;
                }
                let normalized: String = slice.iter().map(normalize_stmt).collect::<Vec<_>>().join(" ");
                windows.push((first_line, normalized, window_len));
            }
        }
    }
    windows
}

fn collect_blocks<'a>(file: &'a syn::File, out: &mut Vec<&'a syn::Block>) {
    fn walk_item<'a>(item: &'a syn::Item, blocks: &mut Vec<&'a syn::Block>) {
        if let syn::Item::Fn(f) = item {
            blocks.push(&f.block);
            walk_block(&f.block, blocks);
        }
        if let syn::Item::Impl(imp) = item {
            for item in &imp.items {
                if let syn::ImplItem::Fn(f) = item {
                    blocks.push(&f.block);
                    walk_block(&f.block, blocks);
                }
            }
        }
        if let syn::Item::Mod(m) = item {
            if let Some((_, items)) = &m.content {
                for it in items {
                    walk_item(it, blocks);
                }
            }
        }
    }
    fn walk_block<'a>(block: &'a syn::Block, blocks: &mut Vec<&'a syn::Block>) {
        for stmt in &block.stmts {
            if let syn::Stmt::Expr(expr, _) = stmt {
                walk_expr(expr, blocks);
            }
        }
    }
    fn walk_expr<'a>(expr: &'a syn::Expr, blocks: &mut Vec<&'a syn::Block>) {
        match expr {
            syn::Expr::If(e) => {
                blocks.push(&e.then_branch);
                walk_block(&e.then_branch, blocks);
                if let Some((_, eb)) = &e.else_branch {
                    walk_expr(eb, blocks);
                }
            }
            syn::Expr::ForLoop(e) => {
                blocks.push(&e.body);
                walk_block(&e.body, blocks);
            }
            syn::Expr::While(e) => {
                blocks.push(&e.body);
                walk_block(&e.body, blocks);
            }
            syn::Expr::Loop(e) => {
                blocks.push(&e.body);
                walk_block(&e.body, blocks);
            }
            syn::Expr::Block(e) => {
                blocks.push(&e.block);
                walk_block(&e.block, blocks);
            }
            syn::Expr::Match(e) => {
                for arm in &e.arms {
                    walk_expr(&arm.body, blocks);
                }
            }
            _ => {}
        }
    }

    for item in &file.items {
        walk_item(item, out);
    }
}

/// Run duplication detection across a package's files, returning groups
/// with >= 2 occurrences, deterministically ordered.
pub fn detect_duplication(files: &[ParsedRustFile]) -> Vec<DuplicateBlock> {
    let mut by_hash: HashMap<u64, Vec<(PathBuf, usize, usize)>> = HashMap::new();

    for file in files {
        for (line, normalized, stmt_count) in windows_in_file(file) {
            let hash = xxh64(normalized.as_bytes(), 0);
            by_hash
                .entry(hash)
                .or_default()
                .push((file.path.clone(), line, stmt_count));
        }
    }

    let mut blocks: Vec<DuplicateBlock> = by_hash
        .into_iter()
        .filter(|(_, occ)| occ.len() >= 2)
        .map(|(hash, mut occ)| {
            occ.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
            occ.dedup_by(|a, b| a.0 == b.0 && a.1 == b.1);
            let statement_count = occ.first().map(|o| o.2).unwrap_or(MIN_STATEMENTS);
            DuplicateBlock {
                hash,
                occurrences: occ.into_iter().map(|(f, l, _)| (f, l)).collect(),
                statement_count,
            }
        })
        .filter(|b| b.occurrences.len() >= 2)
        .collect();

    blocks.sort_by(|a, b| {
        let a0 = &a.occurrences[0];
        let b0 = &b.occurrences[0];
        a0.0.cmp(&b0.0).then(a0.1.cmp(&b0.1))
    });

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FileClass;

    fn file(path: &str, src: &str) -> ParsedRustFile {
        ParsedRustFile {
            path: PathBuf::from(path),
            rel_path: PathBuf::from(path),
            source: src.to_string(),
            ast: syn::parse_file(src).unwrap(),
            is_test: false,
        }
    }

    #[test]
    fn identical_blocks_with_renamed_identifiers_are_flagged() {
        let src_a = "fn a() {\n let x = 1;\n let y = 2;\n let z = 3;\n println!(\"{}\", x);\n println!(\"{}\", y);\n println!(\"{}\", z);\n}\n";
        let src_b = "fn b() {\n let p = 1;\n let q = 2;\n let r = 3;\n println!(\"{}\", p);\n println!(\"{}\", q);\n println!(\"{}\", r);\n}\n";
        let files = vec![file("a.rs", src_a), file("b.rs", src_b)];
        let dups = detect_duplication(&files);
        assert!(!dups.is_empty(), "expected at least one duplicate group");
        assert!(dups.iter().any(|d| d.occurrences.len() >= 2));
    }

    #[test]
    fn unique_code_reports_nothing() {
        let src_a = "fn a() { let x = 1; x; }\n";
        let src_b = "fn b() { let y = compute_something_else(); y }\n";
        let files = vec![file("a.rs", src_a), file("b.rs", src_b)];
        let dups = detect_duplication(&files);
        assert!(dups.is_empty());
    }
}
