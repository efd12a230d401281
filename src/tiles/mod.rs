pub mod cache;
pub mod pyramid;
pub mod store;

pub use cache::{ScaledTileCache, ScaledTileKey};
pub use pyramid::{LoadFailure, PyramidSnapshot, Tile, TilePyramid};
pub use store::{LevelSwap, TileStore};
