//! Read-through cache for list views that are refetched on change notifications.
//!
//! The cached value is an immutable snapshot behind an `Arc`. Invalidation
//! drops the snapshot; the next reader reloads it in full. Entries are never
//! patched in place.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

struct Slot<T> {
    value: Option<Arc<T>>,
    /// Bumped on every invalidation so a load that raced with a write is not stored.
    generation: u64,
}

pub struct ReadThroughCache<T> {
    slot: Arc<RwLock<Slot<T>>>,
}

impl<T> Clone for ReadThroughCache<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for ReadThroughCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReadThroughCache<T> {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(RwLock::new(Slot {
                value: None,
                generation: 0,
            })),
        }
    }

    /// Returns the cached snapshot, or runs `loader` and caches its result.
    ///
    /// Loader errors are returned as-is and nothing is cached.
    pub async fn get_or_load<F, Fut, E>(&self, loader: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let generation = {
            let slot = self.slot.read().await;
            if let Some(v) = &slot.value {
                return Ok(Arc::clone(v));
            }
            slot.generation
        };

        let fresh = Arc::new(loader().await?);

        let mut slot = self.slot.write().await;
        if slot.generation == generation {
            slot.value = Some(Arc::clone(&fresh));
        }
        Ok(fresh)
    }

    /// Drops the current snapshot.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        slot.value = None;
        slot.generation = slot.generation.wrapping_add(1);
    }

    pub async fn is_populated(&self) -> bool {
        self.slot.read().await.value.is_some()
    }
}
