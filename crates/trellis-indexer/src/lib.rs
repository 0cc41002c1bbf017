//! File parsing and symbol extraction

pub mod coordinator;
pub mod error;
pub mod extractor;
pub mod languages;
pub mod link;
pub mod outline;
pub mod source;

#[cfg(test)]
mod tests;

pub use coordinator::Coordinator;
pub use error::{ExtractError, Result};
pub use extractor::{LanguageExtractor, Outliner};
pub use languages::ExtractorRegistry;
pub use link::link_files;
pub use outline::{CallTarget, FileOutline};
pub use source::{FsSourceProvider, MemorySourceProvider, SourceFile, SourceProvider, DEFAULT_EXCLUDES};
