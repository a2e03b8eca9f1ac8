use crate::world::{basin::DrainageNetwork, hex::AxialCoord};
use log::trace;
use lru::LruCache;
use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// Shared store of built drainage networks, keyed by basin coordinate.
///
/// Networks are expensive to build and every region near a basin needs the
/// same one, so they are kept around. With a capacity of zero nothing is ever
/// evicted; otherwise the least recently used network goes first once the
/// cache is full.
pub struct BasinCache {
    networks: Mutex<LruCache<AxialCoord, Arc<DrainageNetwork>>>,
}

impl BasinCache {
    pub fn new(capacity: usize) -> Self {
        let networks = match NonZeroUsize::new(capacity) {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };
        Self {
            networks: Mutex::new(networks),
        }
    }

    /// Get the network for a basin, building it with `build` if it isn't
    /// cached. The lock is not held during the build, so two threads can end
    /// up building the same basin at once. Builds are deterministic, so
    /// whichever finishes first is kept and both callers get the same
    /// network.
    pub fn get_or_build(
        &self,
        basin: AxialCoord,
        build: impl FnOnce() -> DrainageNetwork,
    ) -> Arc<DrainageNetwork> {
        if let Some(network) = self.lock().get(&basin) {
            trace!("Basin cache hit for {}", basin);
            return Arc::clone(network);
        }

        let network = Arc::new(build());
        Arc::clone(self.lock().get_or_insert(basin, || network))
    }

    /// Cached network for a basin, if there is one
    pub fn get(&self, basin: AxialCoord) -> Option<Arc<DrainageNetwork>> {
        self.lock().get(&basin).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // Nothing can be left half-written in the map by a panicking thread, so a
    // poisoned lock is still safe to use
    fn lock(
        &self,
    ) -> MutexGuard<'_, LruCache<AxialCoord, Arc<DrainageNetwork>>> {
        self.networks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
