//! Single-slot snapshot cache shared between a sampler and its readers

use std::sync::Arc;
use tokio::sync::RwLock;

/// Holder for the most recent complete snapshot of one sampler.
///
/// One writer (the poll loop) replaces the slot wholesale; any number of
/// readers clone the current `Arc` out of it. `None` means no poll has ever
/// succeeded. No history is kept; last write wins.
#[derive(Debug)]
pub struct SnapshotCache<T> {
    slot: RwLock<Option<Arc<T>>>,
}

impl<T> SnapshotCache<T> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Replace the current snapshot. This is the only write operation.
    pub async fn replace(&self, snapshot: T) {
        *self.slot.write().await = Some(Arc::new(snapshot));
    }

    /// The latest complete snapshot, or `None` if no poll has ever
    /// succeeded. Readers never observe a partially written snapshot: the
    /// slot holds fully constructed values only.
    pub async fn latest(&self) -> Option<Arc<T>> {
        self.slot.read().await.clone()
    }
}

impl<T> Default for SnapshotCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
