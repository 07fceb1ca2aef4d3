//! Pausing the snapshot folder watcher during writes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared flag that tells a folder watcher to ignore events.
///
/// The writer takes a [`PauseGuard`] before touching files and drops it
/// once the write has finished. The watcher checks
/// [`WatchGate::is_paused`] before reacting to a change. Pauses nest, so
/// concurrent writers keep the watcher paused until the last one finishes.
#[derive(Debug, Clone, Default)]
pub struct WatchGate {
    depth: Arc<AtomicUsize>,
}

impl WatchGate {
    /// Creates an open gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pauses the watcher until the returned guard is dropped.
    #[must_use = "the watcher resumes as soon as the guard is dropped"]
    pub fn pause(&self) -> PauseGuard {
        self.depth.fetch_add(1, Ordering::SeqCst);
        PauseGuard {
            depth: Arc::clone(&self.depth),
        }
    }

    /// Returns true while any pause is held.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.depth.load(Ordering::SeqCst) > 0
    }
}

/// Keeps a [`WatchGate`] paused while alive.
#[derive(Debug)]
pub struct PauseGuard {
    depth: Arc<AtomicUsize>,
}

impl Drop for PauseGuard {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }
}
