//! Symbol table for cross-file call resolution

use crate::model::{NodeId, NodeKind};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Maps qualified symbol identity `(file, name)` to the declaring node.
/// Thread-safe for concurrent population from parallel parsers.
pub struct SymbolTable {
    symbols: DashMap<(String, String), (NodeId, NodeKind)>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            symbols: DashMap::new(),
        }
    }

    /// Record a declaration. The first declaration of a name in a file wins.
    pub fn insert(&self, file: &str, name: &str, node_id: NodeId, kind: NodeKind) {
        let key = (file.to_string(), name.to_string());
        if let Entry::Vacant(slot) = self.symbols.entry(key) {
            slot.insert((node_id, kind));
        }
    }

    /// Look up any declaration by qualified identity.
    pub fn lookup(&self, file: &str, name: &str) -> Option<(NodeId, NodeKind)> {
        self.symbols
            .get(&(file.to_string(), name.to_string()))
            .map(|r| r.value().clone())
    }

    /// Look up a function declaration by qualified identity. Other kinds do not resolve.
    pub fn resolve_function(&self, file: &str, name: &str) -> Option<NodeId> {
        match self.lookup(file, name) {
            Some((id, NodeKind::Function)) => Some(id),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
