//! Per-file structural outline produced by a language walker

use std::collections::{BTreeSet, HashSet};
use tree_sitter::Node;
use trellis_core::{NodeKind, TextRange};

/// A top-level declaration found in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Declared name, or the syntactic kind when the declaration is anonymous.
    pub name: String,
    pub kind: NodeKind,
    pub range: TextRange,
}

/// One import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Literal module specifier as written.
    pub specifier: String,
    /// Local names bound by the import, with the exported name each refers to.
    pub bindings: Vec<ImportBinding>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub local: String,
    pub exported: String,
}

/// What a call expression refers to, as far as syntax can tell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallTarget {
    /// A name from the file's own top-level scope.
    Local(String),
    /// A name bound by an import statement.
    Imported { specifier: String, name: String },
}

/// Everything the linker needs from one file.
#[derive(Debug, Clone, Default)]
pub struct FileOutline {
    pub declarations: Vec<Declaration>,
    pub imports: Vec<Import>,
    pub calls: Vec<CallTarget>,
    /// Extra exported names for declarations, as `(alias, declared name)`,
    /// e.g. `("default", "main")` for `export default function main`.
    pub aliases: Vec<(String, String)>,
}

impl FileOutline {
    /// Classify a call to a bare identifier not shadowed by a local binding.
    pub fn classify_call(&self, name: &str) -> CallTarget {
        for import in self.imports.iter().rev() {
            if let Some(binding) = import.bindings.iter().find(|b| b.local == name) {
                return CallTarget::Imported {
                    specifier: import.specifier.clone(),
                    name: binding.exported.clone(),
                };
            }
        }
        CallTarget::Local(name.to_string())
    }

    /// Raw call names collected during the walk, turned into targets once all
    /// imports of the file are known.
    pub fn resolve_calls(&mut self, names: Vec<String>) {
        let mut seen = HashSet::new();
        for name in names {
            let target = self.classify_call(&name);
            if seen.insert(target.clone()) {
                self.calls.push(target);
            }
        }
    }

    /// Distinct import specifiers in first-seen order.
    pub fn specifiers(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.imports
            .iter()
            .map(|i| i.specifier.as_str())
            .filter(|s| seen.insert(*s))
            .collect()
    }
}

/// Stack of function scopes used to drop calls to shadowed names.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<HashSet<String>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, names: HashSet<String>) {
        self.scopes.push(names);
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// True when `name` is bound by any enclosing function scope.
    pub fn shadows(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains(name))
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

pub fn range_of(node: Node) -> TextRange {
    TextRange::new(node.start_byte(), node.end_byte())
}

pub fn text_of<'s>(node: Node, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or_default()
}

/// Text of a string literal node without its quotes.
pub fn unquote(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_prefix(['"', '\'', '`']).unwrap_or(trimmed);
    trimmed.strip_suffix(['"', '\'', '`']).unwrap_or(trimmed)
}

/// Name of `node`'s `name` field, or `None` for anonymous declarations.
pub fn field_text<'s>(node: Node, field: &str, source: &'s [u8]) -> Option<&'s str> {
    node.child_by_field_name(field)
        .map(|n| text_of(n, source))
        .filter(|s| !s.is_empty())
}

/// Collect every `identifier`-kind descendant of `node` (inclusive) into `out`.
pub fn collect_identifiers(node: Node, source: &[u8], kinds: &[&str], out: &mut HashSet<String>) {
    if kinds.contains(&node.kind()) {
        out.insert(text_of(node, source).to_string());
        return;
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_identifiers(child, source, kinds, out);
    }
}
