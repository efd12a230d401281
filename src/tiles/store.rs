use crate::core::config::ViewerConfig;
use crate::prelude::Arc;
use crate::tiles::cache::ScaledTileCache;
use crate::tiles::pyramid::{PyramidSnapshot, TilePyramid};

/// Outcome of asking the store to activate another level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSwap {
    /// The requested level is already active
    Unchanged,
    Swapped { from: u32, to: u32 },
    /// The requested level has no tiles; the previous level stays active
    RejectedEmpty { requested: u32 },
}

/// The active pyramid snapshot together with its scaled-tile cache.
///
/// A level change builds the complete new snapshot first and replaces the
/// active one in a single assignment, so a render pass never sees a partially
/// loaded level.
#[derive(Debug)]
pub struct TileStore {
    pyramid: TilePyramid,
    snapshot: Arc<PyramidSnapshot>,
    cache: ScaledTileCache,
}

impl TileStore {
    /// Opens the pyramid described by `config` and loads `level`
    pub fn open(config: &ViewerConfig, level: u32) -> Self {
        let pyramid = TilePyramid::from_config(&config.tiles);
        let snapshot = pyramid.load(level);
        if snapshot.is_empty() {
            log::warn!(
                "starting level {} has no tiles under {}",
                level,
                pyramid.root().display()
            );
        }
        let cache = ScaledTileCache::new(
            config.cache.capacity,
            config.tiles.tile_size,
            config.cache.zoom_quantum,
        );
        log::debug!(
            "scaled tile cache: {} entries, up to {} MiB",
            config.cache.capacity,
            config.cache.estimated_memory_usage(config.tiles.tile_size) / (1024 * 1024)
        );
        Self::with_snapshot(pyramid, snapshot, cache)
    }

    /// Assembles a store from parts, binding the cache to the snapshot
    pub fn with_snapshot(pyramid: TilePyramid, snapshot: PyramidSnapshot, mut cache: ScaledTileCache) -> Self {
        cache.bind(snapshot.generation());
        Self {
            pyramid,
            snapshot: Arc::new(snapshot),
            cache,
        }
    }

    pub fn active_level(&self) -> u32 {
        self.snapshot.level()
    }

    pub fn snapshot(&self) -> &Arc<PyramidSnapshot> {
        &self.snapshot
    }

    pub fn cache(&self) -> &ScaledTileCache {
        &self.cache
    }

    /// Split borrow used by the compositor
    pub fn parts_mut(&mut self) -> (&PyramidSnapshot, &mut ScaledTileCache) {
        (self.snapshot.as_ref(), &mut self.cache)
    }

    /// Loads `level` and makes it active if it has at least one tile
    pub fn request_level(&mut self, level: u32) -> LevelSwap {
        let from = self.active_level();
        if level == from {
            return LevelSwap::Unchanged;
        }

        let candidate = self.pyramid.load(level);
        if candidate.is_empty() {
            log::warn!("level {} has no tiles; staying on level {}", level, from);
            return LevelSwap::RejectedEmpty { requested: level };
        }

        log::info!("switching from level {} to level {} ({} tiles)", from, level, candidate.len());
        self.cache.bind(candidate.generation());
        self.snapshot = Arc::new(candidate);
        LevelSwap::Swapped { from, to: level }
    }
}
