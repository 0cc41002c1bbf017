//! Consumer-side copy of the graph, kept in sync from a message stream

use crate::graph::SymbolGraph;
use crate::merge;
use crate::protocol::GraphMessage;
use tracing::{debug, warn};

/// What applying one message did to the replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Replaced,
    Patched,
    /// A patch arrived before any baseline and was merged onto an empty graph.
    PatchWithoutBaseline,
}

/// A consumer's copy of the symbol graph.
#[derive(Debug, Default, Clone)]
pub struct GraphReplica {
    graph: Option<SymbolGraph>,
}

impl GraphReplica {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one message: a baseline replaces, a patch merges.
    pub fn apply(&mut self, message: GraphMessage) -> ApplyOutcome {
        match message {
            GraphMessage::GraphUpdate(graph) => {
                debug!(
                    "replica baseline: {} nodes, {} edges",
                    graph.node_count(),
                    graph.edge_count()
                );
                self.graph = Some(graph);
                ApplyOutcome::Replaced
            }
            GraphMessage::SymbolPatch(patch) => match self.graph.as_mut() {
                Some(graph) => {
                    merge::apply(graph, &patch);
                    ApplyOutcome::Patched
                }
                None => {
                    warn!("patch received before any baseline ({})", patch.summary());
                    self.graph = Some(merge::merge(&SymbolGraph::new(), &patch));
                    ApplyOutcome::PatchWithoutBaseline
                }
            },
        }
    }

    pub fn graph(&self) -> Option<&SymbolGraph> {
        self.graph.as_ref()
    }

    pub fn has_baseline(&self) -> bool {
        self.graph.is_some()
    }
}
