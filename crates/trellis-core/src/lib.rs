//! Trellis Core: symbol graph model, diff engine, and patch merge

pub mod model;
pub mod graph;
pub mod diff;
pub mod merge;
pub mod protocol;
pub mod replica;
pub mod symbols;
pub mod view;


#[cfg(test)]
pub mod test_utils;

pub use model::{NodeId, EdgeId, NodeKind, EdgeKind, TextRange, GraphNode, GraphEdge};
pub use graph::SymbolGraph;
pub use diff::{diff, PatchSummary, SymbolGraphPatch};
pub use merge::merge;
pub use protocol::{ClientMessage, GraphMessage};
pub use replica::{ApplyOutcome, GraphReplica};
pub use symbols::SymbolTable;
pub use view::{Endpoint, GraphView};
