//! Read-only traversal view over a snapshot, backed by petgraph::StableDiGraph

use crate::graph::SymbolGraph;
use crate::model::*;
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use std::collections::HashMap;

/// A vertex of the view: either a node of the snapshot or an edge endpoint
/// that has no node (a file path, an external module specifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Node(NodeId),
    External(NodeId),
}

impl Endpoint {
    pub fn id(&self) -> &NodeId {
        match self {
            Endpoint::Node(id) | Endpoint::External(id) => id,
        }
    }
}

/// Directed traversal view of one [`SymbolGraph`]. Rebuilt per snapshot.
pub struct GraphView<'g> {
    source: &'g SymbolGraph,
    inner: StableDiGraph<Endpoint, &'g GraphEdge>,
    index: HashMap<&'g str, NodeIndex>,
}

impl std::fmt::Debug for GraphView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphView")
            .field("vertex_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl<'g> GraphView<'g> {
    pub fn new(source: &'g SymbolGraph) -> Self {
        let mut inner = StableDiGraph::new();
        let mut index = HashMap::new();

        for node in source.nodes() {
            let idx = inner.add_node(Endpoint::Node(node.id.clone()));
            index.insert(node.id.as_str(), idx);
        }

        for edge in source.edges() {
            let from = Self::vertex(&mut inner, &mut index, &edge.from);
            let to = Self::vertex(&mut inner, &mut index, &edge.to);
            inner.add_edge(from, to, edge);
        }

        GraphView { source, inner, index }
    }

    fn vertex(
        inner: &mut StableDiGraph<Endpoint, &'g GraphEdge>,
        index: &mut HashMap<&'g str, NodeIndex>,
        id: &'g NodeId,
    ) -> NodeIndex {
        *index
            .entry(id.as_str())
            .or_insert_with(|| inner.add_node(Endpoint::External(id.clone())))
    }

    /// Number of vertices, external endpoints included.
    pub fn vertex_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Get all outgoing edges of an id.
    pub fn outgoing(&self, id: &str) -> Vec<&'g GraphEdge> {
        self.edges_directed(id, Direction::Outgoing)
    }

    /// Get all incoming edges of an id.
    pub fn incoming(&self, id: &str) -> Vec<&'g GraphEdge> {
        self.edges_directed(id, Direction::Incoming)
    }

    fn edges_directed(&self, id: &str, direction: Direction) -> Vec<&'g GraphEdge> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut edges: Vec<&'g GraphEdge> = self
            .inner
            .edges_directed(idx, direction)
            .map(|edge_ref| *edge_ref.weight())
            .collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));
        edges
    }

    /// Nodes reached from `id` through `calls` edges.
    pub fn callees(&self, id: &str) -> Vec<&'g GraphNode> {
        self.outgoing(id)
            .into_iter()
            .filter(|e| e.kind == EdgeKind::Calls)
            .filter_map(|e| self.source.node(e.to.as_str()))
            .collect()
    }

    /// Edge endpoints that are not nodes of the snapshot, in id order.
    pub fn external_endpoints(&self) -> Vec<&NodeId> {
        let mut external: Vec<&NodeId> = self
            .inner
            .node_indices()
            .filter_map(|idx| match self.inner.node_weight(idx)? {
                Endpoint::External(id) => Some(id),
                Endpoint::Node(_) => None,
            })
            .collect();
        external.sort();
        external
    }
}
