//! Change detection and graph synchronisation

pub mod debounce;
pub mod service;
pub mod session;
pub mod watcher;

#[cfg(test)]
mod tests;

pub use debounce::Debouncer;
pub use service::WatcherService;
pub use session::{RebuildOutcome, SyncSession, DEFAULT_CHANNEL_CAPACITY};
pub use watcher::{FileWatcher, TriggerFilter, WatchEvent};
