//! The symbol graph snapshot: id-keyed node and edge sets plus diagnostics

use crate::model::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full set of extracted nodes and edges for a workspace at one point in time.
///
/// Nodes and edges are keyed by id, so ids are unique by construction and
/// iteration follows id order.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "GraphRepr", into = "GraphRepr")]
pub struct SymbolGraph {
    nodes: BTreeMap<NodeId, GraphNode>,
    edges: BTreeMap<EdgeId, GraphEdge>,
    diagnostics: Vec<String>,
}

/// Wire shape: `{ nodes: [...], edges: [...], diagnostics?: [...] }`.
#[derive(Serialize, Deserialize)]
struct GraphRepr {
    #[serde(default)]
    nodes: Vec<GraphNode>,
    #[serde(default)]
    edges: Vec<GraphEdge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<String>,
}

impl From<GraphRepr> for SymbolGraph {
    fn from(repr: GraphRepr) -> Self {
        let mut graph = SymbolGraph::from_parts(repr.nodes, repr.edges);
        graph.diagnostics = repr.diagnostics;
        graph
    }
}

impl From<SymbolGraph> for GraphRepr {
    fn from(graph: SymbolGraph) -> Self {
        GraphRepr {
            nodes: graph.nodes.into_values().collect(),
            edges: graph.edges.into_values().collect(),
            diagnostics: graph.diagnostics,
        }
    }
}

impl std::fmt::Debug for SymbolGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolGraph")
            .field("node_count", &self.nodes.len())
            .field("edge_count", &self.edges.len())
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

impl SymbolGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from node and edge lists. A later duplicate id replaces an earlier one.
    pub fn from_parts(
        nodes: impl IntoIterator<Item = GraphNode>,
        edges: impl IntoIterator<Item = GraphEdge>,
    ) -> Self {
        let mut graph = SymbolGraph::new();
        for node in nodes {
            graph.insert_node(node);
        }
        for edge in edges {
            graph.insert_edge(edge);
        }
        graph
    }

    /// Insert or replace a node. Returns the node previously stored under the same id.
    pub fn insert_node(&mut self, node: GraphNode) -> Option<GraphNode> {
        self.nodes.insert(node.id.clone(), node)
    }

    /// Insert a node only if its id is not taken yet. Returns whether it was inserted.
    pub fn insert_node_if_absent(&mut self, node: GraphNode) -> bool {
        use std::collections::btree_map::Entry;
        match self.nodes.entry(node.id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(node);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Insert or replace an edge. Returns the edge previously stored under the same id.
    pub fn insert_edge(&mut self, edge: GraphEdge) -> Option<GraphEdge> {
        self.edges.insert(edge.id.clone(), edge)
    }

    pub fn remove_node(&mut self, id: &str) -> Option<GraphNode> {
        self.nodes.remove(id)
    }

    pub fn remove_edge(&mut self, id: &str) -> Option<GraphEdge> {
        self.edges.remove(id)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edges.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    /// Iterate over all nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Iterate over all edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = &EdgeId> {
        self.edges.keys()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Get all nodes of a specific kind.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &GraphNode> + '_ {
        self.nodes.values().filter(move |n| n.kind == kind)
    }

    /// Get all edges of a specific kind.
    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &GraphEdge> + '_ {
        self.edges.values().filter(move |e| e.kind == kind)
    }

    /// Non-fatal extraction warnings, in the order they were recorded.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    pub fn push_diagnostic(&mut self, message: impl Into<String>) {
        self.diagnostics.push(message.into());
    }

    pub fn set_diagnostics(&mut self, diagnostics: Vec<String>) {
        self.diagnostics = diagnostics;
    }

    /// Absorb a fragment (e.g. one extractor's output) into this graph.
    pub fn extend(&mut self, fragment: SymbolGraph) {
        self.nodes.extend(fragment.nodes);
        self.edges.extend(fragment.edges);
        self.diagnostics.extend(fragment.diagnostics);
    }

    /// Set-equality by node id and edge id. Field contents and diagnostics are ignored.
    pub fn same_elements(&self, other: &SymbolGraph) -> bool {
        self.nodes.keys().eq(other.nodes.keys()) && self.edges.keys().eq(other.edges.keys())
    }
}
