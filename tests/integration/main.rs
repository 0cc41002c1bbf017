//! Integration tests for Trellis
//!
//! These tests drive real workspaces on disk through the indexer, the
//! session, the watcher, the server and the CLI binary.

use futures_util::StreamExt;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use trellis_core::{GraphMessage, GraphReplica, SymbolGraph};
use trellis_indexer::Coordinator;
use trellis_server::{ServerConfig, TrellisServer};
use trellis_watcher::{RebuildOutcome, SyncSession, WatcherService};

fn write(root: &Path, path: &str, text: &str) {
    let path = root.join(path);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, text).unwrap();
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/util.ts", "export function format(v: number) { return `${v}`; }\n");
    write(
        dir.path(),
        "src/main.ts",
        "import { format } from './util';\nexport function main() { format(1); }\n",
    );
    write(dir.path(), "tools/report.py", "def render():\n    pass\n\ndef run():\n    render()\n");
    write(dir.path(), "node_modules/pkg/index.js", "export function hidden() {}\n");
    dir
}

async fn fresh_build(root: &Path) -> SymbolGraph {
    Coordinator::for_workspace(root).unwrap().build().await.unwrap()
}

#[tokio::test]
async fn test_edit_rebuild_replica_matches_fresh_build() {
    let dir = workspace();
    let session = SyncSession::new(Coordinator::for_workspace(dir.path()).unwrap());
    let mut rx = session.subscribe();
    let mut replica = GraphReplica::new();

    session.rebuild().await.unwrap();
    let baseline = session.snapshot().await.unwrap();
    assert!(baseline.contains_edge("calls:src/main.ts@caller->src/util.ts#format"));
    assert!(baseline.contains_edge("calls:tools/report.py@caller->tools/report.py#render"));
    assert!(!baseline.nodes().any(|n| n.id.as_str().starts_with("node_modules/")));

    write(dir.path(), "src/util.ts", "export function render(v: number) { return `${v}`; }\n");
    write(
        dir.path(),
        "src/main.ts",
        "import { render } from './util';\nexport function main() { render(1); }\n",
    );
    let outcome = session.rebuild().await.unwrap();
    assert!(matches!(outcome, RebuildOutcome::Patched(_)));

    std::fs::remove_file(dir.path().join("tools/report.py")).unwrap();
    session.rebuild().await.unwrap();

    while let Ok(message) = rx.try_recv() {
        replica.apply(message);
    }

    let fresh = fresh_build(dir.path()).await;
    let replicated = replica.graph().unwrap();
    assert!(replicated.same_elements(&fresh));
    assert!(replicated.contains_edge("calls:src/main.ts@caller->src/util.ts#render"));
    assert!(!replicated.contains_node("tools/report.py@caller"));
}

#[tokio::test]
async fn test_watcher_pushes_patch_after_save() {
    let dir = workspace();
    let session = Arc::new(SyncSession::new(Coordinator::for_workspace(dir.path()).unwrap()));
    let mut rx = session.subscribe();

    let service = WatcherService::new(dir.path(), Arc::clone(&session), Duration::from_millis(50)).unwrap();
    let handle = tokio::spawn(service.run());

    let baseline = timeout(Duration::from_secs(10), rx.recv()).await.unwrap().unwrap();
    assert!(matches!(baseline, GraphMessage::GraphUpdate(_)));

    write(dir.path(), "src/extra.ts", "export function extra() {}\n");

    let patch = timeout(Duration::from_secs(10), async {
        loop {
            if let GraphMessage::SymbolPatch(patch) = rx.recv().await.unwrap() {
                if patch.nodes_added.iter().any(|n| n.id.as_str() == "src/extra.ts#extra") {
                    return patch;
                }
            }
        }
    })
    .await
    .unwrap();
    assert!(patch.nodes_removed.is_empty());

    handle.abort();
}

async fn receive<S>(socket: &mut S) -> GraphMessage
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        match socket.next().await.unwrap().unwrap() {
            Message::Text(text) => return GraphMessage::from_json(&text).unwrap(),
            Message::Close(_) => panic!("socket closed"),
            _ => continue,
        }
    }
}

#[tokio::test]
async fn test_websocket_client_follows_edits() {
    let dir = workspace();
    let session = Arc::new(SyncSession::new(Coordinator::for_workspace(dir.path()).unwrap()));
    session.rebuild().await.unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(TrellisServer::new(ServerConfig::default(), Arc::clone(&session)).serve(listener));

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{address}/ws")).await.unwrap();
    let mut replica = GraphReplica::new();

    replica.apply(receive(&mut socket).await);
    assert!(replica.has_baseline());

    write(dir.path(), "src/util.ts", "export function format(v: number) { return `${v}`; }\nexport function parse() {}\n");
    session.rebuild().await.unwrap();

    let message = receive(&mut socket).await;
    assert!(matches!(message, GraphMessage::SymbolPatch(_)));
    replica.apply(message);

    let fresh = fresh_build(dir.path()).await;
    assert!(replica.graph().unwrap().same_elements(&fresh));
    assert!(replica.graph().unwrap().contains_node("src/util.ts#parse"));
}

fn trellis(args: &[&str]) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_trellis"))
        .args(args)
        .output()
        .expect("failed to run trellis");
    assert!(
        output.status.success(),
        "trellis {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn test_cli_index_diff_merge() {
    let dir = workspace();
    let root = dir.path().to_str().unwrap();
    let before = dir.path().join("before.json");
    let after = dir.path().join("after.json");
    let patch = dir.path().join("patch.json");
    let none = dir.path().join("none.json");

    trellis(&["--root", root, "index", "--output", before.to_str().unwrap()]);
    write(dir.path(), "src/extra.ts", "export function extra() {}\n");
    trellis(&["--root", root, "index", "--output", after.to_str().unwrap()]);

    std::fs::write(&none, "null").unwrap();
    assert_eq!(trellis(&["diff", none.to_str().unwrap(), after.to_str().unwrap()]).trim(), "null");

    let printed = trellis(&["diff", before.to_str().unwrap(), after.to_str().unwrap()]);
    std::fs::write(&patch, &printed).unwrap();
    let value: serde_json::Value = serde_json::from_str(&printed).unwrap();
    assert_eq!(value["nodesAdded"][0]["id"], "src/extra.ts#extra");

    let merged = trellis(&["merge", before.to_str().unwrap(), patch.to_str().unwrap()]);
    let merged: SymbolGraph = serde_json::from_str(&merged).unwrap();
    let expected: SymbolGraph = serde_json::from_str(&std::fs::read_to_string(&after).unwrap()).unwrap();
    assert!(merged.same_elements(&expected));
}

#[test]
fn test_cli_version() {
    let stdout = trellis(&["version"]);
    assert!(stdout.starts_with("Trellis v"));
}
