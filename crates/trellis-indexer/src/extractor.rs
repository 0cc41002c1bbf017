//! Language extractor trait definitions

use crate::error::Result;
use crate::outline::FileOutline;
use crate::source::SourceFile;
use std::collections::BTreeSet;
use trellis_core::SymbolGraph;

/// Builds the graph fragment for every file of one source language.
///
/// `Err` means the extractor as a whole could not run (e.g. its grammar failed
/// to load). Failures confined to single files are reported as diagnostics on
/// the returned graph instead.
pub trait LanguageExtractor: Send + Sync {
    /// Stable name used in diagnostics, e.g. `typescript`.
    fn name(&self) -> &'static str;

    /// Lower-case file extensions handled by this extractor.
    fn extensions(&self) -> &'static [&'static str];

    fn build(&self, files: &[SourceFile]) -> Result<SymbolGraph>;
}

/// The syntax-specific half of an extractor: turns one parsed file into an
/// outline and resolves module specifiers to workspace files.
pub trait Outliner: Send + Sync {
    /// Grammar used for `path`.
    fn grammar(&self, path: &str) -> tree_sitter::Language;

    fn outline(&self, tree: &tree_sitter::Tree, source: &[u8]) -> FileOutline;

    /// Map `specifier`, as written in `from`, to one of `files`. Specifiers
    /// naming packages outside the workspace resolve to `None`.
    fn resolve_module(&self, from: &str, specifier: &str, files: &BTreeSet<String>) -> Option<String>;
}
