//! Watch loop: filesystem events in, debounced rebuilds out

use crate::debounce::Debouncer;
use crate::session::{RebuildOutcome, SyncSession};
use crate::watcher::{FileWatcher, TriggerFilter};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Watcher service that turns file changes into graph rebuilds
pub struct WatcherService {
    session: Arc<SyncSession>,
    watcher: FileWatcher,
    debounce: Duration,
}

impl WatcherService {
    pub fn new(root: impl AsRef<Path>, session: Arc<SyncSession>, debounce: Duration) -> Result<Self> {
        let filter = TriggerFilter::for_registry(root.as_ref(), session.coordinator().registry());
        let watcher = FileWatcher::new(root, filter)?;
        Ok(Self {
            session,
            watcher,
            debounce,
        })
    }

    pub fn session(&self) -> &Arc<SyncSession> {
        &self.session
    }

    /// Publish the baseline, then rebuild after every quiet period following
    /// a burst of changes. Returns when the watcher's event stream closes.
    pub async fn run(mut self) -> Result<()> {
        self.watcher.watch()?;
        report(self.session.rebuild().await);

        let session = Arc::clone(&self.session);
        let debouncer = Debouncer::new(self.debounce, move || {
            let session = Arc::clone(&session);
            async move { report(session.rebuild().await) }
        });

        let events = self.watcher.event_receiver();
        while let Some(event) = events.recv().await {
            debug!("Change detected: {:?}", event);
            debouncer.trigger();
        }

        info!("Watch event stream closed");
        Ok(())
    }
}

/// Log a rebuild result. Failed rebuilds keep the previous state.
pub fn report(result: Result<RebuildOutcome>) {
    match result {
        Ok(RebuildOutcome::Baseline { nodes, edges }) => info!("Baseline built: {} nodes, {} edges", nodes, edges),
        Ok(RebuildOutcome::Patched(summary)) => info!("Graph updated: {}", summary),
        Ok(RebuildOutcome::Unchanged) => debug!("Graph unchanged"),
        Err(e) => warn!("Rebuild failed: {:#}", e),
    }
}
