//! CLI command implementations

use crate::config::Config;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trellis_core::{SymbolGraph, SymbolGraphPatch};
use trellis_indexer::Coordinator;
use trellis_server::TrellisServer;
use trellis_watcher::{SyncSession, WatcherService};

fn coordinator(root: &Path, config: &Config) -> Result<Coordinator> {
    Coordinator::for_workspace_with_excludes(root, config.index.exclude.iter().map(String::as_str))
        .with_context(|| format!("opening workspace {}", root.display()))
}

pub async fn serve(root: PathBuf, config: Config) -> Result<()> {
    tracing::info!("Starting Trellis server on {}", config.server.address());

    let session = Arc::new(SyncSession::new(coordinator(&root, &config)?));

    // The watcher publishes the baseline, then debounced patches.
    let service = WatcherService::new(&root, Arc::clone(&session), config.watch.debounce())?;
    tokio::spawn(async move {
        if let Err(e) = service.run().await {
            tracing::error!("File watcher error: {:#}", e);
        }
    });

    TrellisServer::new(config.server, session).run().await
}

pub async fn index(root: PathBuf, config: Config, output: Option<PathBuf>) -> Result<()> {
    tracing::info!("Indexing repository: {}", root.display());

    let graph = coordinator(&root, &config)?.build().await?;
    for diagnostic in graph.diagnostics() {
        tracing::warn!("{}", diagnostic);
    }
    tracing::info!("Indexed {} nodes, {} edges", graph.node_count(), graph.edge_count());

    let json = serde_json::to_string_pretty(&graph)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Graph written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Print the patch between two graph files. `previous` may hold `null`.
pub fn diff(previous: &Path, next: &Path) -> Result<()> {
    let previous: Option<SymbolGraph> = read_json(previous)?;
    let next: SymbolGraph = read_json(next)?;

    let patch = trellis_core::diff(previous.as_ref(), &next);
    if let Some(patch) = &patch {
        tracing::info!("Patch: {}", patch.summary());
    }
    println!("{}", serde_json::to_string_pretty(&patch)?);
    Ok(())
}

/// Print `base` with `patch` applied.
pub fn merge(base: &Path, patch: &Path) -> Result<()> {
    let base: SymbolGraph = read_json(base)?;
    let patch: SymbolGraphPatch = read_json(patch)?;

    let merged = trellis_core::merge(&base, &patch);
    println!("{}", serde_json::to_string_pretty(&merged)?);
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}
