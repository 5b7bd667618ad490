use rustc_hash::FxHashMap as HashMap;
use tracing::info;

use crate::core::chunk::{ChunkHandle, ChunkRef};
use crate::core::position::{ChunkKey, ChunkPos};

/// Bounded map of every chunk the world currently remembers.
///
/// When an insert would exceed the capacity, the entries farthest from the
/// observer are dropped in one batch. Chunks for which `protected` returns
/// true (the active footprint) are never chosen.
pub struct ChunkCache {
    map: HashMap<ChunkKey, ChunkRef>,
    capacity: usize,
    eviction_batch: usize,
}

impl ChunkCache {
    pub fn new(capacity: usize, eviction_batch: usize) -> Self {
        Self {
            map: HashMap::default(),
            capacity: capacity.max(1),
            eviction_batch: eviction_batch.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.map.contains_key(&pos.key())
    }

    pub fn get(&self, pos: ChunkPos) -> Option<ChunkRef> {
        self.map.get(&pos.key()).cloned()
    }

    /// Inserts `chunk`, evicting first if the cache is full and the key is new.
    /// Returns how many entries were evicted.
    pub fn insert(
        &mut self,
        chunk: ChunkRef,
        observer: ChunkPos,
        protected: impl Fn(ChunkPos) -> bool,
    ) -> usize {
        let key = chunk.position().key();
        let mut evicted = 0;
        if !self.map.contains_key(&key) && self.map.len() >= self.capacity {
            evicted = self.evict(observer, protected);
        }
        self.map.insert(key, chunk);
        evicted
    }

    /// Returns the cached chunk at `pos`, creating and inserting an empty one
    /// if there is none.
    pub fn get_or_create(
        &mut self,
        pos: ChunkPos,
        observer: ChunkPos,
        protected: impl Fn(ChunkPos) -> bool,
    ) -> ChunkRef {
        if let Some(chunk) = self.get(pos) {
            return chunk;
        }
        let chunk = ChunkHandle::new(pos);
        self.insert(chunk.clone(), observer, protected);
        chunk
    }

    /// Every cached chunk, in no particular order.
    pub fn chunks(&self) -> Vec<ChunkRef> {
        self.map.values().cloned().collect()
    }

    fn evict(&mut self, observer: ChunkPos, protected: impl Fn(ChunkPos) -> bool) -> usize {
        let mut candidates: Vec<(i64, ChunkPos)> = self
            .map
            .values()
            .map(|c| c.position())
            .filter(|&pos| !protected(pos))
            .map(|pos| (pos.distance_sq(observer), pos))
            .collect();

        // farthest first, position as a stable tie-break
        candidates.sort_unstable_by(|a, b| b.cmp(a));

        let count = self.eviction_batch.min(candidates.len());
        for &(_, pos) in &candidates[..count] {
            self.map.remove(&pos.key());
        }

        info!(
            "Evicted {} chunks from cache ({} remain, observer at {},{})",
            count,
            self.map.len(),
            observer.x,
            observer.z
        );
        count
    }
}
