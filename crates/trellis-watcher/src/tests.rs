//! Session tests over an in-memory workspace

use crate::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use tokio::sync::broadcast::error::TryRecvError;
use trellis_core::{GraphMessage, GraphReplica};
use trellis_indexer::{
    Coordinator, ExtractError, ExtractorRegistry, MemorySourceProvider, Result as ExtractResult, SourceProvider,
};

fn session(provider: &MemorySourceProvider) -> SyncSession {
    let coordinator = Coordinator::new(Arc::new(provider.clone()), ExtractorRegistry::with_defaults());
    SyncSession::new(coordinator)
}

fn workspace() -> MemorySourceProvider {
    MemorySourceProvider::with_files([
        ("src/util.ts", "export function format(v: number) { return `${v}`; }\n"),
        ("src/main.ts", "import { format } from './util';\nexport function main() { format(1); }\n"),
    ])
}

/// Provider whose listing can be switched to fail.
struct FlakyProvider {
    inner: MemorySourceProvider,
    failing: AtomicBool,
}

impl SourceProvider for FlakyProvider {
    fn list_files(&self) -> ExtractResult<Vec<String>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ExtractError::Io {
                path: ".".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk gone"),
            });
        }
        self.inner.list_files()
    }

    fn read(&self, path: &str) -> ExtractResult<String> {
        self.inner.read(path)
    }
}

/// Provider whose next listing, once armed, stalls after reading the file
/// list until released, so that build finishes after a later one.
struct GatedProvider {
    inner: MemorySourceProvider,
    armed: AtomicBool,
    listed: Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
    release: Mutex<Option<mpsc::Receiver<()>>>,
}

impl SourceProvider for GatedProvider {
    fn list_files(&self) -> ExtractResult<Vec<String>> {
        let files = self.inner.list_files()?;
        if self.armed.swap(false, Ordering::SeqCst) {
            if let Some(listed) = self.listed.lock().unwrap().take() {
                let _ = listed.send(());
            }
            if let Some(release) = self.release.lock().unwrap().take() {
                let _ = release.recv();
            }
        }
        Ok(files)
    }

    fn read(&self, path: &str) -> ExtractResult<String> {
        self.inner.read(path)
    }
}

#[tokio::test]
async fn test_first_rebuild_publishes_baseline() {
    let provider = workspace();
    let session = session(&provider);
    let mut rx = session.subscribe();

    let outcome = session.rebuild().await.unwrap();
    assert!(matches!(outcome, RebuildOutcome::Baseline { nodes, .. } if nodes > 0));

    match rx.try_recv().unwrap() {
        GraphMessage::GraphUpdate(graph) => assert!(graph.contains_node("src/util.ts#format")),
        other => panic!("expected GRAPH_UPDATE, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unchanged_rebuild_publishes_nothing() {
    let provider = workspace();
    let session = session(&provider);
    session.rebuild().await.unwrap();
    let mut rx = session.subscribe();

    assert_eq!(session.rebuild().await.unwrap(), RebuildOutcome::Unchanged);
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_edit_publishes_patch() {
    let provider = workspace();
    let session = session(&provider);
    session.rebuild().await.unwrap();
    let mut rx = session.subscribe();

    provider.insert("src/extra.ts", "export function extra() {}\n");
    let outcome = session.rebuild().await.unwrap();
    let RebuildOutcome::Patched(summary) = outcome else {
        panic!("expected a patch, got {outcome:?}");
    };
    assert_eq!(summary.nodes_added, 1);
    assert_eq!(summary.nodes_removed, 0);

    match rx.try_recv().unwrap() {
        GraphMessage::SymbolPatch(patch) => {
            assert_eq!(patch.nodes_added[0].id.as_str(), "src/extra.ts#extra");
        }
        other => panic!("expected SYMBOL_PATCH, got {other:?}"),
    }
}

#[tokio::test]
async fn test_replica_tracks_session_state() {
    let provider = workspace();
    let session = session(&provider);
    let mut rx = session.subscribe();
    let mut replica = GraphReplica::new();

    session.rebuild().await.unwrap();
    // Rename the callee: the call edge and declaration both move.
    provider.insert("src/util.ts", "export function render(v: number) { return `${v}`; }\n");
    provider.insert("src/main.ts", "import { render } from './util';\nexport function main() { render(1); }\n");
    session.rebuild().await.unwrap();
    provider.remove("src/main.ts");
    session.rebuild().await.unwrap();

    let mut received = 0;
    while let Ok(message) = rx.try_recv() {
        replica.apply(message);
        received += 1;
    }

    let snapshot = session.snapshot().await.unwrap();
    let replicated = replica.graph().unwrap();
    assert!(replicated.same_elements(&snapshot));
    assert_eq!(received, 3);
    assert!(!replicated.contains_node("src/main.ts@caller"));
}

#[tokio::test]
async fn test_reset_forces_baseline() {
    let provider = workspace();
    let session = session(&provider);
    session.rebuild().await.unwrap();
    session.reset().await;
    assert!(session.snapshot().await.is_none());
    assert!(matches!(session.rebuild().await.unwrap(), RebuildOutcome::Baseline { .. }));
}

#[tokio::test]
async fn test_attach_pairs_snapshot_with_subscription() {
    let provider = workspace();
    let session = session(&provider);

    let (snapshot, _rx) = session.attach().await;
    assert!(snapshot.is_none());
    assert_eq!(session.subscriber_count(), 1);

    session.rebuild().await.unwrap();
    let (snapshot, _rx2) = session.attach().await;
    assert!(snapshot.unwrap().contains_node("src/main.ts#main"));
}

#[tokio::test]
async fn test_failed_build_keeps_previous_state() {
    let provider = Arc::new(FlakyProvider {
        inner: workspace(),
        failing: AtomicBool::new(false),
    });
    let coordinator = Coordinator::new(provider.clone(), ExtractorRegistry::with_defaults());
    let session = SyncSession::new(coordinator);
    session.rebuild().await.unwrap();
    let mut rx = session.subscribe();

    provider.failing.store(true, Ordering::SeqCst);
    assert!(session.rebuild().await.is_err());
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    assert!(session.snapshot().await.unwrap().contains_node("src/util.ts#format"));

    provider.failing.store(false, Ordering::SeqCst);
    assert_eq!(session.rebuild().await.unwrap(), RebuildOutcome::Unchanged);
}

#[test]
fn test_rebuild_outcome_json() {
    insta::assert_json_snapshot!(RebuildOutcome::Baseline { nodes: 3, edges: 2 }, @r###"
    {
      "outcome": "baseline",
      "nodes": 3,
      "edges": 2
    }
    "###);
    insta::assert_json_snapshot!(RebuildOutcome::Unchanged, @r###"
    {
      "outcome": "unchanged"
    }
    "###);
}

#[tokio::test]
async fn test_overlapping_rebuilds_keep_channel_consistent() {
    let (listed_tx, listed_rx) = tokio::sync::oneshot::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let provider = Arc::new(GatedProvider {
        inner: MemorySourceProvider::with_files([("src/a.ts", "export function a() {}\n")]),
        armed: AtomicBool::new(false),
        listed: Mutex::new(Some(listed_tx)),
        release: Mutex::new(Some(release_rx)),
    });
    let coordinator = Coordinator::new(provider.clone(), ExtractorRegistry::with_defaults());
    let session = Arc::new(SyncSession::new(coordinator));
    let mut rx = session.subscribe();
    session.rebuild().await.unwrap();

    // The slow rebuild lists the workspace before the edit, then stalls.
    provider.armed.store(true, Ordering::SeqCst);
    let slow = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.rebuild().await }
    });
    listed_rx.await.unwrap();

    // The fast rebuild sees the edit and finishes first.
    provider.inner.insert("src/b.ts", "export function b() {}\n");
    let fast = session.rebuild().await.unwrap();
    assert!(matches!(fast, RebuildOutcome::Patched(summary) if summary.nodes_added == 1));

    release_tx.send(()).unwrap();
    let RebuildOutcome::Patched(stale) = slow.await.unwrap().unwrap() else {
        panic!("slow rebuild should patch against the fast one");
    };
    // Last writer wins: the stale build is recorded and published.
    assert_eq!(stale.nodes_removed, 1);

    let mut replica = GraphReplica::new();
    while let Ok(message) = rx.try_recv() {
        replica.apply(message);
    }
    let snapshot = session.snapshot().await.unwrap();
    assert!(!snapshot.contains_node("src/b.ts#b"));
    assert!(replica.graph().unwrap().same_elements(&snapshot));
}

#[tokio::test]
async fn test_record_publishes_without_building() {
    let provider = workspace();
    let session = session(&provider);
    let mut rx = session.subscribe();

    let graph = session.coordinator().build().await.unwrap();
    assert!(matches!(session.record(graph.clone()).await, RebuildOutcome::Baseline { .. }));
    assert_eq!(session.record(graph).await, RebuildOutcome::Unchanged);
    assert!(matches!(rx.try_recv().unwrap(), GraphMessage::GraphUpdate(_)));
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}
