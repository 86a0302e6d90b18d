//! Lock-free block caching for chunked raster access

use std::sync::Arc;
use dashmap::DashMap;
use crossbeam::queue::SegQueue;

/// Lock-free tile cache holding decoded blocks keyed by block index
///
/// Eviction is first-in first-out: each newly inserted key is queued once
/// and inserts pop from the front until there is room. Reads never touch the
/// queue, so it holds at most one entry per cached block.
pub struct TileCache<T> {
    cache: Arc<DashMap<usize, Arc<Vec<T>>>>,
    fifo: Arc<SegQueue<usize>>,
    max_tiles: usize,
}

impl<T> TileCache<T> {
    /// Creates a new lock-free tile cache
    ///
    /// # Arguments
    /// * `max_tiles` - Maximum number of blocks to cache (at least 1)
    pub fn new(max_tiles: usize) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            fifo: Arc::new(SegQueue::new()),
            max_tiles: max_tiles.max(1),
        }
    }

    /// Gets a block from the cache
    pub fn get(&self, index: usize) -> Option<Arc<Vec<T>>> {
        self.cache.get(&index).map(|entry| Arc::clone(entry.value()))
    }

    /// Puts a block into the cache and returns the shared copy
    pub fn put(&self, index: usize, data: Vec<T>) -> Arc<Vec<T>> {
        let data = Arc::new(data);

        while self.cache.len() >= self.max_tiles {
            match self.fifo.pop() {
                Some(old) => {
                    self.cache.remove(&old);
                }
                None => break,
            }
        }

        if self.cache.insert(index, Arc::clone(&data)).is_none() {
            self.fifo.push(index);
        }
        data
    }

    /// Clears the cache
    pub fn clear(&self) {
        self.cache.clear();
        while self.fifo.pop().is_some() {}
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let total_bytes: usize = self.cache
            .iter()
            .map(|entry| entry.value().len() * std::mem::size_of::<T>())
            .sum();

        CacheStats {
            tile_count: self.cache.len(),
            total_bytes,
            max_tiles: self.max_tiles,
        }
    }
}

impl<T> Clone for TileCache<T> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            fifo: Arc::clone(&self.fifo),
            max_tiles: self.max_tiles,
        }
    }
}

impl<T> Default for TileCache<T> {
    fn default() -> Self {
        Self::new(256)
    }
}

impl<T> std::fmt::Debug for TileCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileCache")
            .field("len", &self.cache.len())
            .field("max_tiles", &self.max_tiles)
            .finish()
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of blocks currently in cache
    pub tile_count: usize,
    /// Total bytes of decoded samples held
    pub total_bytes: usize,
    /// Maximum number of blocks
    pub max_tiles: usize,
}
