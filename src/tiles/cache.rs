use crate::core::geo::TileIndex;
use crate::prelude::Arc;
use crate::tiles::pyramid::Tile;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Cache key for a resampled tile.
///
/// The zoom scale is stored as an integer number of `1 / quantum` steps so
/// equality and hashing never depend on floating point noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScaledTileKey {
    pub col: i32,
    pub row: i32,
    pub quantized_scale: u32,
}

impl ScaledTileKey {
    pub fn new(index: TileIndex, zoom_scale: f64, quantum: u32) -> Self {
        Self {
            col: index.col,
            row: index.row,
            quantized_scale: quantize(zoom_scale, quantum),
        }
    }

    pub fn index(&self) -> TileIndex {
        TileIndex::new(self.col, self.row)
    }

    /// The zoom scale this key stands for
    pub fn scale(&self, quantum: u32) -> f64 {
        self.quantized_scale as f64 / quantum as f64
    }
}

fn quantize(zoom_scale: f64, quantum: u32) -> u32 {
    let steps = (zoom_scale * quantum as f64).round();
    if steps.is_finite() {
        steps.clamp(1.0, u32::MAX as f64) as u32
    } else {
        1
    }
}

/// Memoizes tiles resampled to the current zoom scale.
///
/// Entries belong to one pyramid snapshot generation; binding a different
/// generation drops everything.
#[derive(Debug)]
pub struct ScaledTileCache {
    entries: LruCache<ScaledTileKey, Arc<RgbaImage>>,
    tile_size: u32,
    quantum: u32,
    generation: Option<u64>,
    resamples: u64,
    hits: u64,
}

impl ScaledTileCache {
    /// Create a new scaled tile cache with the given capacity
    pub fn new(capacity: usize, tile_size: u32, quantum: u32) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            tile_size: tile_size.max(1),
            quantum: quantum.max(1),
            generation: None,
            resamples: 0,
            hits: 0,
        }
    }

    pub fn key(&self, index: TileIndex, zoom_scale: f64) -> ScaledTileKey {
        ScaledTileKey::new(index, zoom_scale, self.quantum)
    }

    /// Pixel side length of a tile drawn at `zoom_scale`, rounded to the
    /// nearest pixel at the key's scale
    pub fn scaled_extent(&self, zoom_scale: f64) -> u32 {
        self.extent_for(&self.key(TileIndex::new(0, 0), zoom_scale))
    }

    fn extent_for(&self, key: &ScaledTileKey) -> u32 {
        ((self.tile_size as f64 * key.scale(self.quantum)).round() as u32).max(1)
    }

    /// Returns `tile` resampled to roughly `tile_size × zoom_scale`,
    /// resampling only on a miss.
    pub fn get(&mut self, index: TileIndex, tile: &Tile, zoom_scale: f64) -> Arc<RgbaImage> {
        let key = self.key(index, zoom_scale);
        if let Some(image) = self.entries.get(&key) {
            self.hits += 1;
            return Arc::clone(image);
        }

        let extent = self.extent_for(&key);
        let scaled = if tile.image.dimensions() == (extent, extent) {
            Arc::clone(&tile.image)
        } else {
            Arc::new(imageops::resize(tile.image.as_ref(), extent, extent, FilterType::Triangle))
        };
        self.resamples += 1;
        log::trace!("scaled tile {} to {}px (key {:?})", index, extent, key);

        self.entries.put(key, Arc::clone(&scaled));
        scaled
    }

    /// Ties the cache to a snapshot generation, clearing it if it changed
    pub fn bind(&mut self, generation: u64) {
        if self.generation != Some(generation) {
            if !self.entries.is_empty() {
                log::debug!(
                    "dropping {} scaled tiles from generation {:?}",
                    self.entries.len(),
                    self.generation
                );
            }
            self.entries.clear();
            self.generation = Some(generation);
        }
    }

    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    /// Clear all scaled tiles from the cache
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, key: &ScaledTileKey) -> bool {
        self.entries.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Number of cache fills since creation
    pub fn resample_count(&self) -> u64 {
        self.resamples
    }

    pub fn hit_count(&self) -> u64 {
        self.hits
    }
}
