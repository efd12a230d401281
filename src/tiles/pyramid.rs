//! On-disk tile pyramid loading.
//!
//! The pyramid lives under a root directory as `<level>/<column>/<row>.<ext>`.
//! A level is decoded synchronously and handed out as an immutable
//! [`PyramidSnapshot`]; callers swap whole snapshots, never patch them.

use crate::core::bounds::TileBounds;
use crate::core::config::TileSourceConfig;
use crate::core::geo::TileIndex;
use crate::prelude::{Arc, HashMap};
use image::RgbaImage;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Decoded image for one (level, column, row)
#[derive(Debug, Clone)]
pub struct Tile {
    pub level: u32,
    pub index: TileIndex,
    pub image: Arc<RgbaImage>,
}

impl Tile {
    pub fn new(level: u32, index: TileIndex, image: RgbaImage) -> Self {
        Self {
            level,
            index,
            image: Arc::new(image),
        }
    }
}

/// A tile entry that was skipped while scanning a level
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// All tiles of exactly one integer level
#[derive(Debug)]
pub struct PyramidSnapshot {
    level: u32,
    generation: u64,
    tiles: HashMap<TileIndex, Tile>,
    bounds: Option<TileBounds>,
    failures: Vec<LoadFailure>,
}

impl PyramidSnapshot {
    /// Builds a snapshot from already decoded tiles
    pub fn from_tiles(level: u32, tiles: impl IntoIterator<Item = Tile>) -> Self {
        let tiles: HashMap<TileIndex, Tile> = tiles
            .into_iter()
            .map(|tile| (tile.index, tile))
            .collect();
        Self::assemble(level, tiles, Vec::new())
    }

    /// A valid snapshot with no tiles
    pub fn empty(level: u32) -> Self {
        Self::assemble(level, HashMap::default(), Vec::new())
    }

    fn assemble(level: u32, tiles: HashMap<TileIndex, Tile>, failures: Vec<LoadFailure>) -> Self {
        let bounds = TileBounds::from_indices(tiles.keys().copied());
        Self {
            level,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            tiles,
            bounds,
            failures,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Unique per snapshot; caches use it to detect a replaced tile set
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, index: TileIndex) -> Option<&Tile> {
        self.tiles.get(&index)
    }

    pub fn contains(&self, index: TileIndex) -> bool {
        self.tiles.contains_key(&index)
    }

    pub fn bounds(&self) -> Option<&TileBounds> {
        self.bounds.as_ref()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    pub fn indices(&self) -> impl Iterator<Item = TileIndex> + '_ {
        self.tiles.keys().copied()
    }
}

/// Scans and decodes levels of an on-disk tile pyramid
#[derive(Debug, Clone)]
pub struct TilePyramid {
    root: PathBuf,
    extensions: Vec<String>,
}

impl TilePyramid {
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions.iter().map(|ext| ext.to_ascii_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &TileSourceConfig) -> Self {
        Self::new(config.root.clone(), &config.extensions)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn level_dir(&self, level: u32) -> PathBuf {
        self.root.join(level.to_string())
    }

    /// Loads every decodable tile of `level`.
    ///
    /// A missing level directory yields an empty snapshot. Entries whose names
    /// do not parse as integers and images that fail to decode are recorded in
    /// [`PyramidSnapshot::failures`] and skipped.
    pub fn load(&self, level: u32) -> PyramidSnapshot {
        let level_dir = self.level_dir(level);
        let mut tiles = HashMap::default();
        let mut failures = Vec::new();

        let columns = match sorted_entries(&level_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("level {} has no directory at {}", level, level_dir.display());
                return PyramidSnapshot::empty(level);
            }
            Err(e) => {
                log::warn!("cannot read level directory {}: {}", level_dir.display(), e);
                failures.push(LoadFailure {
                    path: level_dir,
                    reason: e.to_string(),
                });
                return PyramidSnapshot::assemble(level, tiles, failures);
            }
        };

        for column_path in columns {
            if !column_path.is_dir() {
                continue;
            }
            let Some(col) = parse_index(column_path.file_name()) else {
                failures.push(LoadFailure {
                    reason: "column directory name is not an integer".to_string(),
                    path: column_path,
                });
                continue;
            };

            let rows = match sorted_entries(&column_path) {
                Ok(rows) => rows,
                Err(e) => {
                    failures.push(LoadFailure {
                        reason: e.to_string(),
                        path: column_path,
                    });
                    continue;
                }
            };

            for row_path in rows {
                if !row_path.is_file() || !self.has_tile_extension(&row_path) {
                    continue;
                }
                let Some(row) = parse_index(row_path.file_stem()) else {
                    failures.push(LoadFailure {
                        reason: "row file name is not an integer".to_string(),
                        path: row_path,
                    });
                    continue;
                };

                let index = TileIndex::new(col, row);
                if tiles.contains_key(&index) {
                    failures.push(LoadFailure {
                        reason: format!("duplicate tile {} at level {}", index, level),
                        path: row_path,
                    });
                    continue;
                }

                match image::open(&row_path) {
                    Ok(decoded) => {
                        tiles.insert(index, Tile::new(level, index, decoded.to_rgba8()));
                    }
                    Err(e) => {
                        log::warn!("failed to load {}: {}", row_path.display(), e);
                        failures.push(LoadFailure {
                            reason: e.to_string(),
                            path: row_path,
                        });
                    }
                }
            }
        }

        let snapshot = PyramidSnapshot::assemble(level, tiles, failures);
        log::debug!(
            "loaded level {}: {} tiles, {} skipped, bounds {:?}",
            level,
            snapshot.len(),
            snapshot.failures().len(),
            snapshot.bounds()
        );
        snapshot
    }

    fn has_tile_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            })
            .unwrap_or(false)
    }
}

fn sorted_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .collect::<Vec<_>>();
    paths.sort();
    Ok(paths)
}

fn parse_index(name: Option<&std::ffi::OsStr>) -> Option<i32> {
    name?.to_str()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::fs;
    use tempfile::tempdir;

    fn write_tile(root: &Path, level: u32, col: &str, file: &str) {
        let dir = root.join(level.to_string()).join(col);
        fs::create_dir_all(&dir).unwrap();
        RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]))
            .save(dir.join(file))
            .unwrap();
    }

    fn pyramid(root: &Path) -> TilePyramid {
        TilePyramid::new(root, &["png".to_string(), "webp".to_string()])
    }

    #[test]
    fn test_missing_level_is_empty_snapshot() {
        let dir = tempdir().unwrap();
        let snapshot = pyramid(dir.path()).load(7);
        assert!(snapshot.is_empty());
        assert!(snapshot.bounds().is_none());
        assert!(snapshot.failures().is_empty());
        assert_eq!(snapshot.level(), 7);
    }

    #[test]
    fn test_load_indexes_tiles_and_bounds() {
        let dir = tempdir().unwrap();
        write_tile(dir.path(), 2, "0", "0.png");
        write_tile(dir.path(), 2, "0", "3.png");
        write_tile(dir.path(), 2, "5", "1.png");

        let snapshot = pyramid(dir.path()).load(2);
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.contains(TileIndex::new(5, 1)));
        let bounds = snapshot.bounds().unwrap();
        assert_eq!((bounds.min_col, bounds.max_col), (0, 5));
        assert_eq!((bounds.min_row, bounds.max_row), (0, 3));
        assert_eq!(snapshot.get(TileIndex::new(0, 3)).unwrap().image.dimensions(), (4, 4));
    }

    #[test]
    fn test_malformed_entries_are_skipped_and_recorded() {
        let dir = tempdir().unwrap();
        write_tile(dir.path(), 3, "1", "2.png");
        write_tile(dir.path(), 3, "abc", "2.png");
        write_tile(dir.path(), 3, "1", "x9.png");
        // Wrong extension is ignored without a failure record.
        let col_dir = dir.path().join("3").join("1");
        fs::write(col_dir.join("notes.txt"), b"hello").unwrap();
        // Undecodable payload with a tile extension.
        fs::write(col_dir.join("4.png"), b"definitely not a png").unwrap();

        let snapshot = pyramid(dir.path()).load(3);
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains(TileIndex::new(1, 2)));
        assert_eq!(snapshot.failures().len(), 3);
        assert!(snapshot
            .failures()
            .iter()
            .any(|failure| failure.path.ends_with("4.png")));
    }

    #[test]
    fn test_snapshots_get_distinct_generations() {
        let dir = tempdir().unwrap();
        write_tile(dir.path(), 2, "0", "0.png");
        let pyramid = pyramid(dir.path());
        let first = pyramid.load(2);
        let second = pyramid.load(2);
        assert_ne!(first.generation(), second.generation());
    }

    #[test]
    fn test_negative_indices_parse() {
        let dir = tempdir().unwrap();
        write_tile(dir.path(), 4, "-1", "-2.png");
        let snapshot = pyramid(dir.path()).load(4);
        assert!(snapshot.contains(TileIndex::new(-1, -2)));
    }
}
