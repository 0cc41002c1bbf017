//! Graph diff computation for incremental updates

use crate::graph::SymbolGraph;
use crate::model::*;
use serde::{Deserialize, Serialize};

/// The add/remove delta between two graph snapshots.
///
/// Every sequence defaults to empty when missing from a serialized patch, so a
/// structurally incomplete payload still merges without error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolGraphPatch {
    /// Nodes present in the next snapshot only.
    #[serde(default)]
    pub nodes_added: Vec<GraphNode>,
    /// Ids of nodes present in the previous snapshot only.
    #[serde(default)]
    pub nodes_removed: Vec<NodeId>,
    /// Edges present in the next snapshot only.
    #[serde(default)]
    pub edges_added: Vec<GraphEdge>,
    /// Ids of edges present in the previous snapshot only.
    #[serde(default)]
    pub edges_removed: Vec<EdgeId>,
    /// Replacement diagnostics, present only when they changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Vec<String>>,
}

/// Element counts of a patch, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchSummary {
    pub nodes_added: usize,
    pub nodes_removed: usize,
    pub edges_added: usize,
    pub edges_removed: usize,
}

impl std::fmt::Display for PatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "+{} -{} nodes, +{} -{} edges",
            self.nodes_added, self.nodes_removed, self.edges_added, self.edges_removed
        )
    }
}

impl SymbolGraphPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the patch describes no change at all.
    pub fn is_empty(&self) -> bool {
        self.nodes_added.is_empty()
            && self.nodes_removed.is_empty()
            && self.edges_added.is_empty()
            && self.edges_removed.is_empty()
            && self.diagnostics.is_none()
    }

    pub fn summary(&self) -> PatchSummary {
        PatchSummary {
            nodes_added: self.nodes_added.len(),
            nodes_removed: self.nodes_removed.len(),
            edges_added: self.edges_added.len(),
            edges_removed: self.edges_removed.len(),
        }
    }
}

/// Compute the patch that turns `previous` into `next`.
///
/// Returns `None` when there is no previous snapshot: the caller has nothing
/// to apply a patch to and must ship `next` in full. Otherwise a patch is
/// always returned, possibly empty.
///
/// Elements are compared by id only. A node or edge whose id exists in both
/// snapshots is never reported, even if other fields (such as `range`)
/// changed. Consumers keep the content they first received for an id until
/// that id is removed.
pub fn diff(previous: Option<&SymbolGraph>, next: &SymbolGraph) -> Option<SymbolGraphPatch> {
    let previous = previous?;

    let nodes_added = next
        .nodes()
        .filter(|n| !previous.contains_node(n.id.as_str()))
        .cloned()
        .collect();
    let nodes_removed = previous
        .node_ids()
        .filter(|id| !next.contains_node(id.as_str()))
        .cloned()
        .collect();
    let edges_added = next
        .edges()
        .filter(|e| !previous.contains_edge(e.id.as_str()))
        .cloned()
        .collect();
    let edges_removed = previous
        .edge_ids()
        .filter(|id| !next.contains_edge(id.as_str()))
        .cloned()
        .collect();

    let diagnostics = (previous.diagnostics() != next.diagnostics())
        .then(|| next.diagnostics().to_vec());

    Some(SymbolGraphPatch {
        nodes_added,
        nodes_removed,
        edges_added,
        edges_removed,
        diagnostics,
    })
}
