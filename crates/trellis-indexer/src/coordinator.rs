//! Orchestrates parallel indexing

use crate::error::Result;
use crate::extractor::LanguageExtractor;
use crate::languages::ExtractorRegistry;
use crate::source::{FsSourceProvider, SourceFile, SourceProvider};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use trellis_core::SymbolGraph;

/// Files of one language, ready for its extractor.
struct Batch {
    extractor: Arc<dyn LanguageExtractor>,
    files: Vec<SourceFile>,
}

/// Result of one extractor run.
enum Fragment {
    Built(SymbolGraph),
    Failed(String),
    Panicked,
}

/// Builds whole-workspace symbol graphs from a source provider and a
/// registry of language extractors.
#[derive(Clone)]
pub struct Coordinator {
    provider: Arc<dyn SourceProvider>,
    registry: ExtractorRegistry,
}

impl Coordinator {
    pub fn new(provider: Arc<dyn SourceProvider>, registry: ExtractorRegistry) -> Self {
        Coordinator { provider, registry }
    }

    /// Default extractors over a filesystem walk of `root`.
    pub fn for_workspace(root: impl AsRef<Path>) -> Result<Self> {
        let provider = FsSourceProvider::new(root)?;
        Ok(Self::new(Arc::new(provider), ExtractorRegistry::with_defaults()))
    }

    /// Like [`Coordinator::for_workspace`] with explicit exclude globs.
    pub fn for_workspace_with_excludes<'a>(
        root: impl AsRef<Path>,
        excludes: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self> {
        let provider = FsSourceProvider::with_excludes(root, excludes)?;
        Ok(Self::new(Arc::new(provider), ExtractorRegistry::with_defaults()))
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Build a fresh graph of the whole workspace.
    ///
    /// Per-file read failures and failing or panicking extractors become
    /// diagnostics on the returned graph. `Err` is reserved for failing to
    /// list the workspace at all, in which case no graph is produced.
    pub async fn build(&self) -> Result<SymbolGraph> {
        let started = Instant::now();
        let provider = Arc::clone(&self.provider);
        let registry = self.registry.clone();
        let (batches, read_failures) =
            tokio::task::spawn_blocking(move || collect_batches(provider.as_ref(), &registry)).await??;

        let mut tasks = JoinSet::new();
        for (name, batch) in batches {
            tasks.spawn_blocking(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| batch.extractor.build(&batch.files)));
                let fragment = match outcome {
                    Ok(Ok(graph)) => Fragment::Built(graph),
                    Ok(Err(e)) => Fragment::Failed(e.to_string()),
                    Err(_) => Fragment::Panicked,
                };
                (name, batch.files.len(), fragment)
            });
        }

        let mut fragments = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (name, count, fragment) = joined?;
            debug!("extractor {} finished {} files", name, count);
            fragments.insert(name, fragment);
        }

        let mut graph = SymbolGraph::new();
        for message in read_failures {
            graph.push_diagnostic(message);
        }
        for (name, fragment) in fragments {
            match fragment {
                Fragment::Built(part) => graph.extend(part),
                Fragment::Failed(error) => {
                    warn!("extractor {} failed: {}", name, error);
                    graph.push_diagnostic(format!("extractor {name} failed: {error}"));
                }
                Fragment::Panicked => {
                    warn!("extractor {} panicked", name);
                    graph.push_diagnostic(format!("extractor {name} panicked"));
                }
            }
        }

        info!(
            "Built graph: {} nodes, {} edges, {} diagnostics in {:?}",
            graph.node_count(),
            graph.edge_count(),
            graph.diagnostics().len(),
            started.elapsed()
        );
        Ok(graph)
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator").field("registry", &self.registry).finish()
    }
}

/// List and read every supported file, grouped by extractor name.
fn collect_batches(
    provider: &dyn SourceProvider,
    registry: &ExtractorRegistry,
) -> Result<(BTreeMap<&'static str, Batch>, Vec<String>)> {
    let mut batches: BTreeMap<&'static str, Batch> = BTreeMap::new();
    let mut failures = Vec::new();

    for path in provider.list_files()? {
        let Some(extractor) = registry.extractor_for(&path) else {
            continue;
        };
        let text = match provider.read(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!("{}: {}", path, e);
                failures.push(format!("{path}: {e}"));
                continue;
            }
        };
        batches
            .entry(extractor.name())
            .or_insert_with(|| Batch {
                extractor: Arc::clone(extractor),
                files: Vec::new(),
            })
            .files
            .push(SourceFile::new(path, text));
    }

    Ok((batches, failures))
}
