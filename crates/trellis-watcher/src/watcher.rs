//! Filesystem watcher implementation

use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use trellis_indexer::ExtractorRegistry;

/// Directories whose contents never trigger a rebuild.
const IGNORED_DIRS: &[&str] = &[".git", "node_modules", "target"];

/// Events emitted by the file watcher. Each one is an opaque rebuild trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// File or directory created
    Created(PathBuf),
    /// File or directory modified
    Modified(PathBuf),
    /// File or directory removed
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::Created(path) | WatchEvent::Modified(path) | WatchEvent::Removed(path) => path,
        }
    }
}

/// Decides which paths are worth a rebuild: registered source extensions and
/// CI workflow definitions, outside ignored directories.
#[derive(Debug, Clone)]
pub struct TriggerFilter {
    root: PathBuf,
    extensions: BTreeSet<String>,
}

impl TriggerFilter {
    pub fn new<I, S>(root: impl AsRef<Path>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TriggerFilter {
            root: root.as_ref().to_path_buf(),
            extensions: extensions.into_iter().map(|e| e.into().to_ascii_lowercase()).collect(),
        }
    }

    /// Filter accepting every extension the registry has an extractor for.
    pub fn for_registry(root: impl AsRef<Path>, registry: &ExtractorRegistry) -> Self {
        Self::new(root, registry.extensions())
    }

    pub fn accepts(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let parts: Vec<&str> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => name.to_str(),
                _ => None,
            })
            .collect();

        let Some((file, dirs)) = parts.split_last() else {
            return false;
        };
        if dirs.iter().any(|d| IGNORED_DIRS.contains(d)) {
            return false;
        }

        let extension = file
            .rsplit_once('.')
            .filter(|(stem, _)| !stem.is_empty())
            .map(|(_, ext)| ext.to_ascii_lowercase());
        let Some(extension) = extension else {
            return false;
        };

        if self.extensions.contains(&extension) {
            return true;
        }
        matches!(extension.as_str(), "yml" | "yaml") && dirs.ends_with(&[".github", "workflows"])
    }

    /// Turn one notify event into the watch events it implies.
    pub fn convert(&self, event: notify::Event) -> Vec<WatchEvent> {
        let make: fn(PathBuf) -> WatchEvent = match event.kind {
            notify::EventKind::Create(_) => WatchEvent::Created,
            notify::EventKind::Modify(_) => WatchEvent::Modified,
            notify::EventKind::Remove(_) => WatchEvent::Removed,
            _ => return Vec::new(),
        };
        event
            .paths
            .into_iter()
            .filter(|path| self.accepts(path))
            .map(make)
            .collect()
    }
}

/// File system watcher for monitoring code changes
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    event_rx: mpsc::UnboundedReceiver<WatchEvent>,
    root_path: PathBuf,
}

impl FileWatcher {
    /// Create a watcher for `root_path`; call [`FileWatcher::watch`] to start.
    pub fn new(root_path: impl AsRef<Path>, filter: TriggerFilter) -> Result<Self> {
        let root_path = root_path.as_ref().to_path_buf();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                for watch_event in filter.convert(event) {
                    debug!("Watch event: {:?}", watch_event);
                    if let Err(e) = event_tx.send(watch_event) {
                        warn!("Failed to forward watch event: {}", e);
                    }
                }
            }
            Err(e) => {
                error!("File system watch error: {}", e);
            }
        })
        .context("creating filesystem watcher")?;

        Ok(Self {
            watcher,
            event_rx,
            root_path,
        })
    }

    /// Watch the root directory recursively
    pub fn watch(&mut self) -> Result<()> {
        self.watcher
            .watch(&self.root_path, RecursiveMode::Recursive)
            .with_context(|| format!("watching {}", self.root_path.display()))?;
        info!("Watching directory: {:?}", self.root_path);
        Ok(())
    }

    /// Get the event receiver
    pub fn event_receiver(&mut self) -> &mut mpsc::UnboundedReceiver<WatchEvent> {
        &mut self.event_rx
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }
}
