//! Test utilities for Trellis core

use crate::*;

/// A bare node with the given id.
pub fn node(id: &str) -> GraphNode {
    GraphNode::new(id, NodeKind::Function, id)
}

/// An edge whose id is the plain `from->to` form.
pub fn edge(from: &str, to: &str) -> GraphEdge {
    GraphEdge {
        id: EdgeId(format!("{from}->{to}")),
        from: NodeId::from(from),
        to: NodeId::from(to),
        kind: EdgeKind::Calls,
    }
}

/// Build a graph from node ids and `(from, to)` edge pairs.
pub fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> SymbolGraph {
    SymbolGraph::from_parts(
        nodes.iter().map(|id| node(id)),
        edges.iter().map(|(from, to)| edge(from, to)),
    )
}

/// Sorted node ids of a graph, for compact assertions.
pub fn node_ids(graph: &SymbolGraph) -> Vec<&str> {
    graph.node_ids().map(|id| id.as_str()).collect()
}

/// Sorted edge ids of a graph.
pub fn edge_ids(graph: &SymbolGraph) -> Vec<&str> {
    graph.edge_ids().map(|id| id.as_str()).collect()
}

/// A small family of graphs covering disjoint, overlapping, nested and empty cases.
pub fn graph_family() -> Vec<SymbolGraph> {
    vec![
        SymbolGraph::new(),
        graph(&["a"], &[]),
        graph(&["a", "b"], &[]),
        graph(&["a", "b"], &[("a", "b")]),
        graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]),
        graph(&["c", "d"], &[("c", "d"), ("d", "ext")]),
        graph(&["b"], &[("a", "b"), ("x", "y")]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_builder() {
        let g = graph(&["a", "b"], &[("a", "b")]);
        assert_eq!(node_ids(&g), ["a", "b"]);
        assert_eq!(edge_ids(&g), ["a->b"]);
    }
}
