//! Messages exchanged with graph consumers

use crate::diff::SymbolGraphPatch;
use crate::graph::SymbolGraph;
use serde::{Deserialize, Serialize};

/// Server-to-consumer message. Order on the channel defines the graph state sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum GraphMessage {
    /// Baseline push: replace the consumer's graph.
    #[serde(rename = "GRAPH_UPDATE")]
    GraphUpdate(SymbolGraph),
    /// Incremental push: merge into the consumer's graph.
    #[serde(rename = "SYMBOL_PATCH")]
    SymbolPatch(SymbolGraphPatch),
}

impl GraphMessage {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Consumer-to-server message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Ask for a full GRAPH_UPDATE of the current snapshot.
    #[serde(rename = "REQUEST_GRAPH")]
    RequestGraph,
    #[serde(rename = "PING")]
    Ping,
    #[serde(rename = "PONG")]
    Pong,
}
