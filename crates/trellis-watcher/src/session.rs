//! Last-known graph state and publication of graph messages

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use trellis_core::{diff, GraphMessage, PatchSummary, SymbolGraph};
use trellis_indexer::Coordinator;

/// Messages buffered per subscriber before it is considered lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// What one rebuild published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum RebuildOutcome {
    /// No previous graph: a full GRAPH_UPDATE was published.
    Baseline { nodes: usize, edges: usize },
    /// A non-empty SYMBOL_PATCH was published.
    Patched(PatchSummary),
    /// Nothing changed; nothing was published.
    Unchanged,
}

/// One synchronisation session: the graph consumers were last sent, and the
/// channel future messages go out on.
pub struct SyncSession {
    coordinator: Coordinator,
    last: RwLock<Option<SymbolGraph>>,
    tx: broadcast::Sender<GraphMessage>,
}

impl SyncSession {
    pub fn new(coordinator: Coordinator) -> Self {
        Self::with_capacity(coordinator, DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(coordinator: Coordinator, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        SyncSession {
            coordinator,
            last: RwLock::new(None),
            tx,
        }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Build a fresh graph and publish how it differs from the last one.
    ///
    /// The diff, the publish and the state swap happen under one write lock,
    /// so the message order on the channel always matches the order in which
    /// states were recorded. Two overlapping rebuilds are last-writer-wins:
    /// whichever finishes building last becomes the recorded state.
    pub async fn rebuild(&self) -> Result<RebuildOutcome> {
        let next = self.coordinator.build().await.context("building symbol graph")?;
        Ok(self.record(next).await)
    }

    /// Make `next` the recorded state and publish how it differs from the
    /// previous one. `rebuild` is `Coordinator::build` followed by this.
    pub async fn record(&self, next: SymbolGraph) -> RebuildOutcome {
        let mut last = self.last.write().await;
        let outcome = match diff(last.as_ref(), &next) {
            None => {
                let outcome = RebuildOutcome::Baseline {
                    nodes: next.node_count(),
                    edges: next.edge_count(),
                };
                self.publish(GraphMessage::GraphUpdate(next.clone()));
                debug!("Published baseline: {} nodes, {} edges", next.node_count(), next.edge_count());
                outcome
            }
            Some(patch) if patch.is_empty() => {
                debug!("Rebuild produced no changes");
                RebuildOutcome::Unchanged
            }
            Some(patch) => {
                let summary = patch.summary();
                self.publish(GraphMessage::SymbolPatch(patch));
                debug!("Published patch: {}", summary);
                RebuildOutcome::Patched(summary)
            }
        };
        *last = Some(next);
        outcome
    }

    fn publish(&self, message: GraphMessage) {
        // No subscribers is not an error; consumers get a snapshot on attach.
        if let Err(e) = self.tx.send(message) {
            debug!("No subscribers for {} message", message_type(&e.0));
        }
    }

    /// Clone of the last recorded graph.
    pub async fn snapshot(&self) -> Option<SymbolGraph> {
        self.last.read().await.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GraphMessage> {
        self.tx.subscribe()
    }

    /// Snapshot and subscription taken together: every message received on
    /// the returned receiver applies on top of the returned snapshot.
    pub async fn attach(&self) -> (Option<SymbolGraph>, broadcast::Receiver<GraphMessage>) {
        let last = self.last.read().await;
        (last.clone(), self.tx.subscribe())
    }

    /// Forget the last graph; the next rebuild publishes a baseline.
    pub async fn reset(&self) {
        *self.last.write().await = None;
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

fn message_type(message: &GraphMessage) -> &'static str {
    match message {
        GraphMessage::GraphUpdate(_) => "GRAPH_UPDATE",
        GraphMessage::SymbolPatch(_) => "SYMBOL_PATCH",
    }
}
