//! Applying a patch to a base graph on the consuming side

use crate::diff::SymbolGraphPatch;
use crate::graph::SymbolGraph;

/// Produce the graph obtained by applying `patch` to `base`. `base` is left untouched.
///
/// Additions are applied before removals, for nodes and edges independently,
/// so an id listed both as added and as removed ends up absent.
pub fn merge(base: &SymbolGraph, patch: &SymbolGraphPatch) -> SymbolGraph {
    let mut merged = base.clone();
    apply(&mut merged, patch);
    merged
}

/// In-place variant of [`merge`] for callers that own their copy.
pub fn apply(graph: &mut SymbolGraph, patch: &SymbolGraphPatch) {
    for node in &patch.nodes_added {
        graph.insert_node(node.clone());
    }
    for id in &patch.nodes_removed {
        graph.remove_node(id.as_str());
    }

    for edge in &patch.edges_added {
        graph.insert_edge(edge.clone());
    }
    for id in &patch.edges_removed {
        graph.remove_edge(id.as_str());
    }

    if let Some(diagnostics) = &patch.diagnostics {
        graph.set_diagnostics(diagnostics.clone());
    }
}
