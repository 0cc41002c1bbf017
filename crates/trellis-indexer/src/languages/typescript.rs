//! TypeScript language extractor using tree-sitter

use super::ecmascript;
use crate::error::Result;
use crate::extractor::{LanguageExtractor, Outliner};
use crate::link::link_files;
use crate::outline::FileOutline;
use crate::source::{extension_of, SourceFile};
use std::collections::BTreeSet;
use trellis_core::SymbolGraph;

#[derive(Debug, Default, Clone, Copy)]
pub struct TypeScriptExtractor;

impl TypeScriptExtractor {
    pub fn new() -> Self {
        TypeScriptExtractor
    }
}

impl Outliner for TypeScriptExtractor {
    fn grammar(&self, path: &str) -> tree_sitter::Language {
        // JSX syntax only parses with the TSX grammar.
        match extension_of(path).as_deref() {
            Some("tsx") => tree_sitter_typescript::LANGUAGE_TSX.into(),
            _ => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        }
    }

    fn outline(&self, tree: &tree_sitter::Tree, source: &[u8]) -> FileOutline {
        ecmascript::outline_program(tree.root_node(), source)
    }

    fn resolve_module(&self, from: &str, specifier: &str, files: &BTreeSet<String>) -> Option<String> {
        ecmascript::resolve_relative(from, specifier, files)
    }
}

impl LanguageExtractor for TypeScriptExtractor {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ts", "tsx", "mts", "cts"]
    }

    fn build(&self, files: &[SourceFile]) -> Result<SymbolGraph> {
        link_files(self.name(), self, files)
    }
}
