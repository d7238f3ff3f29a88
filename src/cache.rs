//! Noise layer caching
//!
//! One slot per logical layer, each holding a single entry keyed by the
//! layer's parameter hash. A `put` replaces whatever the slot held; there is
//! no eviction policy beyond that. Regenerating with unchanged noise
//! parameters (e.g. only the terrace count moved) skips the noise entirely.

use crate::tilemap::Tilemap;

/// Most float arrays a single layer produces (Worley: distance, edge, cell value).
pub const MAX_LAYER_ARRAYS: usize = 3;

/// Logical layer slots
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheSlot {
    Elevation,
    River,
    Worley,
}

impl CacheSlot {
    pub const ALL: [CacheSlot; 3] = [CacheSlot::Elevation, CacheSlot::River, CacheSlot::Worley];

    fn index(self) -> usize {
        match self {
            CacheSlot::Elevation => 0,
            CacheSlot::River => 1,
            CacheSlot::Worley => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CacheSlot::Elevation => "elevation",
            CacheSlot::River => "river",
            CacheSlot::Worley => "worley",
        }
    }
}

/// The parallel float arrays one layer produced
#[derive(Clone, Debug, PartialEq)]
pub struct LayerArrays {
    maps: Vec<Tilemap<f32>>,
}

impl LayerArrays {
    pub fn single(map: Tilemap<f32>) -> Self {
        Self { maps: vec![map] }
    }

    /// Wrap up to [`MAX_LAYER_ARRAYS`] maps; extra maps are ignored.
    pub fn new(mut maps: Vec<Tilemap<f32>>) -> Self {
        maps.truncate(MAX_LAYER_ARRAYS);
        Self { maps }
    }

    pub fn get(&self, i: usize) -> Option<&Tilemap<f32>> {
        self.maps.get(i)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn into_maps(self) -> Vec<Tilemap<f32>> {
        self.maps
    }
}

struct CacheEntry {
    hash: u64,
    arrays: LayerArrays,
}

/// Hit/miss counters since creation (or the last [`NoiseCache::reset_stats`])
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    /// Lookups that forced a recompute
    pub misses: u64,
}

/// Single-entry-per-slot layer cache
#[derive(Default)]
pub struct NoiseCache {
    slots: [Option<CacheEntry>; 3],
    stats: CacheStats,
}

impl NoiseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a slot. Counts a hit only if the stored hash matches exactly.
    pub fn get(&mut self, slot: CacheSlot, hash: u64) -> Option<&LayerArrays> {
        if self.contains(slot, hash) {
            self.stats.hits += 1;
            tracing::debug!("{} layer: cache hit ({:016x})", slot.name(), hash);
            self.slots[slot.index()].as_ref().map(|e| &e.arrays)
        } else {
            self.stats.misses += 1;
            tracing::debug!("{} layer: cache miss ({:016x})", slot.name(), hash);
            None
        }
    }

    /// Store a layer, replacing the slot's previous entry.
    pub fn put(&mut self, slot: CacheSlot, hash: u64, arrays: LayerArrays) {
        self.slots[slot.index()] = Some(CacheEntry { hash, arrays });
    }

    /// Whether a slot currently holds an entry for `hash` (does not touch stats).
    pub fn contains(&self, slot: CacheSlot, hash: u64) -> bool {
        matches!(&self.slots[slot.index()], Some(e) if e.hash == hash)
    }

    /// Drop every slot (used on reset or after loading a parameter file).
    pub fn invalidate_all(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        tracing::debug!("noise cache invalidated");
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }
}
