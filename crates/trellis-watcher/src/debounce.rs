//! Trailing-edge debouncing of rebuild triggers

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Collapses a burst of triggers into a single run of `action`, fired once
/// `delay` has passed without a new trigger.
///
/// The action runs as its own task: a trigger arriving after the timer fired
/// arms a new timer but never cancels the action already running.
pub struct Debouncer<F> {
    delay: Duration,
    action: Arc<F>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<F, Fut> Debouncer<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    pub fn new(delay: Duration, action: F) -> Self {
        Debouncer {
            delay,
            action: Arc::new(action),
            pending: Mutex::new(None),
        }
    }

    /// Restart the quiet period. Must be called from within a tokio runtime.
    pub fn trigger(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(timer) = pending.take() {
            timer.abort();
        }

        let action = Arc::clone(&self.action);
        let delay = self.delay;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!("Quiet period of {:?} elapsed, running action", delay);
            tokio::spawn(action());
        }));
    }

    /// Drop the pending timer, if any. An action already running is unaffected.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(timer) = pending.take() {
            timer.abort();
        }
    }

    /// True while a timer is armed and has not fired yet.
    pub fn is_pending(&self) -> bool {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<F> Drop for Debouncer<F> {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(timer) = pending.take() {
            timer.abort();
        }
    }
}
