//! Language extractors for different programming languages

pub mod ecmascript;
pub mod javascript;
pub mod python;
pub mod rust;
pub mod typescript;

use crate::extractor::LanguageExtractor;
use crate::source::extension_of;
use std::collections::BTreeMap;
use std::sync::Arc;

pub use javascript::JavaScriptExtractor;
pub use python::PythonExtractor;
pub use rust::RustExtractor;
pub use typescript::TypeScriptExtractor;

/// Maps file extensions to the extractor responsible for them.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    by_extension: BTreeMap<String, Arc<dyn LanguageExtractor>>,
    extractors: Vec<Arc<dyn LanguageExtractor>>,
}

impl ExtractorRegistry {
    /// Empty registry; every file is unsupported.
    pub fn new() -> Self {
        Self::default()
    }

    /// TypeScript, JavaScript, Python and Rust.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TypeScriptExtractor::new()));
        registry.register(Arc::new(JavaScriptExtractor::new()));
        registry.register(Arc::new(PythonExtractor::new()));
        registry.register(Arc::new(RustExtractor::new()));
        registry
    }

    /// Register an extractor. Later registrations take over extensions
    /// claimed by earlier ones.
    pub fn register(&mut self, extractor: Arc<dyn LanguageExtractor>) {
        for ext in extractor.extensions() {
            self.by_extension.insert(ext.to_string(), Arc::clone(&extractor));
        }
        self.extractors.retain(|e| e.name() != extractor.name());
        self.extractors.push(extractor);
    }

    /// Extractor for a workspace-relative path, if its extension is supported.
    pub fn extractor_for(&self, path: &str) -> Option<&Arc<dyn LanguageExtractor>> {
        let ext = extension_of(path)?;
        self.by_extension.get(&ext)
    }

    pub fn supports(&self, path: &str) -> bool {
        self.extractor_for(path).is_some()
    }

    /// Every registered extension, sorted.
    pub fn extensions(&self) -> Vec<String> {
        self.by_extension.keys().cloned().collect()
    }

    pub fn extractors(&self) -> impl Iterator<Item = &Arc<dyn LanguageExtractor>> {
        self.extractors.iter()
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}
