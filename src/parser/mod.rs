//! Parser layer: a type-aware parser for the primary statically-typed
//! language (Rust, via `syn`) and a Tree-sitter parser for the rest
//! (Python, JavaScript, TypeScript).

pub mod rust_parser;
pub mod treesitter;

pub use rust_parser::{ParsedPackage, ParsedRustFile, RustParser, TypeUniverse};
pub use treesitter::{ParsedTreeSitterFile, TreeGuard, TreeSitterParser};
