//! JavaScript language extractor using tree-sitter

use super::ecmascript;
use crate::error::Result;
use crate::extractor::{LanguageExtractor, Outliner};
use crate::link::link_files;
use crate::outline::FileOutline;
use crate::source::SourceFile;
use std::collections::BTreeSet;
use trellis_core::SymbolGraph;

#[derive(Debug, Default, Clone, Copy)]
pub struct JavaScriptExtractor;

impl JavaScriptExtractor {
    pub fn new() -> Self {
        JavaScriptExtractor
    }
}

impl Outliner for JavaScriptExtractor {
    fn grammar(&self, _path: &str) -> tree_sitter::Language {
        tree_sitter_javascript::LANGUAGE.into()
    }

    fn outline(&self, tree: &tree_sitter::Tree, source: &[u8]) -> FileOutline {
        ecmascript::outline_program(tree.root_node(), source)
    }

    fn resolve_module(&self, from: &str, specifier: &str, files: &BTreeSet<String>) -> Option<String> {
        ecmascript::resolve_relative(from, specifier, files)
    }
}

impl LanguageExtractor for JavaScriptExtractor {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["js", "jsx", "mjs", "cjs"]
    }

    fn build(&self, files: &[SourceFile]) -> Result<SymbolGraph> {
        link_files(self.name(), self, files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::NodeKind;

    #[test]
    fn test_destructured_and_function_expressions() {
        let files = [SourceFile::new(
            "lib/index.js",
            "const { a, b: renamed } = load();\nconst fn1 = function () {};\nfunction load() { return {}; }\n",
        )];
        let graph = JavaScriptExtractor::new().build(&files).unwrap();

        assert_eq!(graph.node("lib/index.js#a").map(|n| n.kind), Some(NodeKind::Variable));
        assert_eq!(graph.node("lib/index.js#renamed").map(|n| n.kind), Some(NodeKind::Variable));
        assert_eq!(graph.node("lib/index.js#fn1").map(|n| n.kind), Some(NodeKind::Function));
        assert!(graph.contains_edge("calls:lib/index.js@caller->lib/index.js#load"));
    }

    #[test]
    fn test_reexport_is_an_import() {
        let files = [
            SourceFile::new("lib/a.mjs", "export function a() {}\n"),
            SourceFile::new("lib/index.mjs", "export { a } from './a.mjs';\nexport * from './a.mjs';\n"),
        ];
        let graph = JavaScriptExtractor::new().build(&files).unwrap();
        assert!(graph.contains_node("lib/index.mjs#import:./a.mjs"));
        assert!(graph.contains_edge("imports:lib/index.mjs->./a.mjs"));
    }

    #[test]
    fn test_jsx_parses() {
        let files = [SourceFile::new(
            "ui/view.jsx",
            "export const View = () => <span>{label()}</span>;\nfunction label() { return 'x'; }\n",
        )];
        let graph = JavaScriptExtractor::new().build(&files).unwrap();
        assert_eq!(graph.node("ui/view.jsx#View").map(|n| n.kind), Some(NodeKind::Function));
        assert!(graph.contains_edge("calls:ui/view.jsx@caller->ui/view.jsx#label"));
    }
}
