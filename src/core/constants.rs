//! Engine-wide defaults for the tile viewer.
//! Keeping them in a single place makes it easier to tweak the magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Lowest zoom factor the view may reach.
pub const MIN_ZOOM: f64 = 2.0;

/// Highest zoom factor the view may reach.
pub const MAX_ZOOM: f64 = 5.0;

/// Zoom level activated when a viewer is created.
pub const START_ZOOM: f64 = 2.0;

/// Per-frame exponential smoothing factor for pan and zoom.
pub const SMOOTH_SPEED: f64 = 0.2;

/// Distance below which an animated value snaps onto its target.
pub const SNAP_EPSILON: f64 = 1e-3;

/// Zoom change applied per scroll notch.
pub const ZOOM_STEP: f64 = 1.0;

/// Scaled-tile cache keys keep two decimal digits of the zoom scale.
pub const ZOOM_QUANTUM: u32 = 100;

/// Upper bound on memoized scaled tiles.
pub const SCALED_CACHE_CAPACITY: usize = 2048;

/// Frame rate the cooperative loop is capped at.
pub const TARGET_FPS: u32 = 60;

/// Tile image extensions probed when scanning a level directory.
pub const TILE_EXTENSIONS: [&str; 4] = ["webp", "png", "jpg", "jpeg"];

/// Dash and gap length of the tile grid, in pixels.
pub const GRID_DASH_LENGTH: u32 = 10;

/// Half width of the main view's center bracket.
pub const CROSSHAIR_HALF_EXTENT: u32 = 50;

/// Log panel row height in pixels.
pub const LOG_ROW_HEIGHT: f64 = 20.0;

/// Number of trailing annotations listed in the log panel.
pub const LOG_VISIBLE_ROWS: usize = 30;
