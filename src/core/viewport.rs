use crate::animation::Smoothing;
use crate::core::bounds::{clamp_offset, offset_ranges, TileBounds};
use crate::core::config::ViewerConfig;
use crate::core::geo::{Point, Size, TileIndex};
use crate::tiles::store::{LevelSwap, TileStore};
use crate::Result;
use serde::{Deserialize, Serialize};

/// How the continuous zoom factor maps to an on-screen tile scale relative to
/// the active pyramid level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleModel {
    /// `2^(zoom - level)`: continuous across level swaps
    #[default]
    Exponential,
    /// `zoom / level`
    Linear,
}

impl ScaleModel {
    /// Tile scale for `zoom` while `level` is the active pyramid level
    pub fn scale(&self, zoom: f64, level: u32) -> f64 {
        match self {
            ScaleModel::Exponential => 2_f64.powf(zoom - level as f64),
            ScaleModel::Linear => zoom / level.max(1) as f64,
        }
    }
}

/// Animated pan/zoom state of one view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub offset: Point,
    pub target_offset: Point,
    pub zoom: f64,
    pub target_zoom: f64,
    pub active_level: u32,
}

impl ViewportState {
    /// A state resting at `zoom` with the map origin at `offset`
    pub fn settled(offset: Point, zoom: f64, active_level: u32) -> Self {
        Self {
            offset,
            target_offset: offset,
            zoom,
            target_zoom: zoom,
            active_level,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.offset == self.target_offset && self.zoom == self.target_zoom
    }
}

/// Inclusive tile index range overlapping a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub min_col: i32,
    pub max_col: i32,
    pub min_row: i32,
    pub max_row: i32,
}

impl TileRange {
    pub fn len(&self) -> usize {
        ((self.max_col - self.min_col + 1) * (self.max_row - self.min_row + 1)) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, index: TileIndex) -> bool {
        index.col >= self.min_col
            && index.col <= self.max_col
            && index.row >= self.min_row
            && index.row <= self.max_row
    }

    /// Row-major iteration over the covered indices
    pub fn iter(&self) -> impl Iterator<Item = TileIndex> {
        let (min_col, max_col) = (self.min_col, self.max_col);
        (self.min_row..=self.max_row)
            .flat_map(move |row| (min_col..=max_col).map(move |col| TileIndex::new(col, row)))
    }
}

/// World ↔ screen mapping for a fixed offset and scale.
///
/// World coordinates are measured in tiles of `level`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub offset: Point,
    pub scale: f64,
    pub tile_size: u32,
    pub level: u32,
}

impl ViewTransform {
    /// On-screen side length of one tile
    pub fn tile_pixels(&self) -> f64 {
        self.tile_size as f64 * self.scale
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        let px = self.tile_pixels();
        Point::new(world.x * px + self.offset.x, world.y * px + self.offset.y)
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        let px = self.tile_pixels();
        if px == 0.0 || !px.is_finite() {
            return Point::new(0.0, 0.0);
        }
        Point::new((screen.x - self.offset.x) / px, (screen.y - self.offset.y) / px)
    }

    /// Screen position of a tile's top-left corner
    pub fn tile_origin(&self, index: TileIndex) -> Point {
        self.world_to_screen(Point::new(index.col as f64, index.row as f64))
    }

    /// Tiles of `bounds` that overlap a `viewport`-sized surface.
    ///
    /// A tile spans `[c·px + offset, (c+1)·px + offset)`; the first overlapping
    /// column is the floor of the left edge and the last is one below the
    /// ceiling of the right edge.
    pub fn visible_tile_range(&self, bounds: Option<&TileBounds>, viewport: Size) -> Option<TileRange> {
        let bounds = bounds?;
        let px = self.tile_pixels();
        if !(px.is_finite() && px > 0.0) {
            return None;
        }

        let first_col = (-self.offset.x / px).floor();
        let last_col = ((viewport.width - self.offset.x) / px).ceil() - 1.0;
        let first_row = (-self.offset.y / px).floor();
        let last_row = ((viewport.height - self.offset.y) / px).ceil() - 1.0;

        let range = TileRange {
            min_col: clamp_index(first_col).max(bounds.min_col),
            max_col: clamp_index(last_col).min(bounds.max_col),
            min_row: clamp_index(first_row).max(bounds.min_row),
            max_row: clamp_index(last_row).min(bounds.max_row),
        };
        if range.min_col > range.max_col || range.min_row > range.max_row {
            None
        } else {
            Some(range)
        }
    }
}

fn clamp_index(value: f64) -> i32 {
    value.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

/// Owns the pan offset and zoom of a view, both current and target, and
/// advances them toward their targets once per frame.
#[derive(Debug, Clone)]
pub struct Viewport {
    state: ViewportState,
    size: Size,
    min_zoom: f64,
    max_zoom: f64,
    tile_size: u32,
    scale_model: ScaleModel,
    smoothing: Smoothing,
    rejected_level: Option<u32>,
}

impl Viewport {
    /// Creates a viewport resting at the configured start zoom. Fails when
    /// `config` does not validate.
    pub fn new(config: &ViewerConfig, size: Size, active_level: u32) -> Result<Self> {
        config.validate()?;
        let zoom = &config.zoom;
        let start = zoom.start_zoom.clamp(zoom.min_zoom, zoom.max_zoom);
        Ok(Self {
            state: ViewportState::settled(Point::default(), start, active_level),
            size,
            min_zoom: zoom.min_zoom,
            max_zoom: zoom.max_zoom,
            tile_size: config.tiles.tile_size,
            scale_model: zoom.scale_model,
            smoothing: Smoothing::new(config.animation.smooth_speed, config.animation.snap_epsilon),
            rejected_level: None,
        })
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn zoom_limits(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn scale_model(&self) -> ScaleModel {
        self.scale_model
    }

    /// Resizes the view and re-clamps the target offset
    pub fn set_size(&mut self, size: Size, bounds: Option<&TileBounds>) {
        self.size = size;
        self.state.target_offset = self.clamp_at(self.state.target_offset, self.target_zoom_scale(), bounds);
    }

    /// Tile scale at the current zoom
    pub fn zoom_scale(&self) -> f64 {
        self.scale_model.scale(self.state.zoom, self.state.active_level)
    }

    /// Tile scale at the target zoom
    pub fn target_zoom_scale(&self) -> f64 {
        self.scale_model.scale(self.state.target_zoom, self.state.active_level)
    }

    /// Tile scale an arbitrary zoom would have on the active level
    pub fn scale_for(&self, zoom: f64) -> f64 {
        self.scale_model.scale(zoom, self.state.active_level)
    }

    /// The mapping currently on screen
    pub fn transform(&self) -> ViewTransform {
        ViewTransform {
            offset: self.state.offset,
            scale: self.zoom_scale(),
            tile_size: self.tile_size,
            level: self.state.active_level,
        }
    }

    /// The mapping the view is animating toward
    pub fn target_transform(&self) -> ViewTransform {
        ViewTransform {
            offset: self.state.target_offset,
            scale: self.target_zoom_scale(),
            tile_size: self.tile_size,
            level: self.state.active_level,
        }
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        self.transform().world_to_screen(world)
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        self.transform().screen_to_world(screen)
    }

    /// World coordinate under the fixed center crosshair
    pub fn center_world(&self) -> Point {
        self.screen_to_world(self.size.center())
    }

    pub fn visible_tile_range(&self, bounds: Option<&TileBounds>) -> Option<TileRange> {
        self.transform().visible_tile_range(bounds, self.size)
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_finite() {
            zoom.clamp(self.min_zoom, self.max_zoom)
        } else {
            self.state.target_zoom
        }
    }

    fn clamp_at(&self, offset: Point, scale: f64, bounds: Option<&TileBounds>) -> Point {
        clamp_offset(offset, bounds, self.size, scale, self.tile_size)
    }

    /// Changes the target zoom by `delta`, keeping the world point under
    /// `anchor` fixed on screen once the animation settles.
    pub fn set_target_zoom(&mut self, delta: f64, anchor: Point, bounds: Option<&TileBounds>) {
        let old_zoom = self.state.target_zoom;
        let new_zoom = self.clamp_zoom(old_zoom + delta);
        if new_zoom == old_zoom {
            return;
        }

        // With the exponential model this ratio is exactly 2^(new - old).
        let ratio = self.scale_for(new_zoom) / self.scale_for(old_zoom);
        let offset = self.state.target_offset;
        let anchored = Point::new(
            anchor.x - ratio * (anchor.x - offset.x),
            anchor.y - ratio * (anchor.y - offset.y),
        );

        self.state.target_zoom = new_zoom;
        self.state.target_offset = self.clamp_at(anchored, self.scale_for(new_zoom), bounds);
        log::debug!(
            "target zoom {:.2} -> {:.2} anchored at ({:.1}, {:.1})",
            old_zoom,
            new_zoom,
            anchor.x,
            anchor.y
        );
    }

    /// Pans the target by a screen-space delta.
    ///
    /// The clamp uses the target zoom's scale so the target offset stays
    /// reachable even while a zoom animation is in flight.
    pub fn set_target_offset(&mut self, delta: Point, bounds: Option<&TileBounds>) {
        if !delta.is_finite() {
            return;
        }
        let candidate = self.state.target_offset.add(&delta);
        self.state.target_offset = self.clamp_at(candidate, self.target_zoom_scale(), bounds);
    }

    /// Replaces both targets at once, clamping zoom and offset
    pub fn set_target(&mut self, target_offset: Point, target_zoom: f64, bounds: Option<&TileBounds>) {
        let zoom = self.clamp_zoom(target_zoom);
        self.state.target_zoom = zoom;
        if target_offset.is_finite() {
            self.state.target_offset = self.clamp_at(target_offset, self.scale_for(zoom), bounds);
        }
    }

    /// Target offset that puts `world` (in active-level units) at the view
    /// center when zoomed to `zoom`
    pub fn centering_offset(&self, world: Point, zoom: f64, bounds: Option<&TileBounds>) -> Point {
        let zoom = self.clamp_zoom(zoom);
        let px = self.tile_size as f64 * self.scale_for(zoom);
        let center = self.size.center();
        let offset = Point::new(center.x - world.x * px, center.y - world.y * px);
        self.clamp_at(offset, self.scale_for(zoom), bounds)
    }

    /// Jumps straight to the targets without animating
    pub fn settle(&mut self) {
        self.state.offset = self.state.target_offset;
        self.state.zoom = self.state.target_zoom;
    }

    /// Advances the animation one frame and switches pyramid level when the
    /// rounded zoom crosses into another level.
    pub fn tick(&mut self, tiles: &mut TileStore) -> LevelSwap {
        let state = &mut self.state;
        state.offset = self.smoothing.step(state.offset, state.target_offset);
        state.zoom = self
            .smoothing
            .step(state.zoom, state.target_zoom)
            .clamp(self.min_zoom, self.max_zoom);

        let desired = state.zoom.round().max(0.0) as u32;
        if desired == state.active_level {
            self.rejected_level = None;
            return LevelSwap::Unchanged;
        }
        if self.rejected_level == Some(desired) {
            return LevelSwap::RejectedEmpty { requested: desired };
        }

        let swap = tiles.request_level(desired);
        match swap {
            LevelSwap::Swapped { to, .. } => {
                self.rejected_level = None;
                self.state.active_level = to;
                let bounds = tiles.snapshot().bounds().copied();
                self.state.target_offset =
                    self.clamp_at(self.state.target_offset, self.target_zoom_scale(), bounds.as_ref());
            }
            LevelSwap::RejectedEmpty { requested } => {
                self.rejected_level = Some(requested);
            }
            LevelSwap::Unchanged => {
                // The store already serves the desired level.
                self.state.active_level = tiles.active_level();
            }
        }
        swap
    }

    /// True when the target offset lies inside the clamp range for the target
    /// zoom's scale
    pub fn target_within_bounds(&self, bounds: Option<&TileBounds>, tolerance: f64) -> bool {
        match offset_ranges(bounds, self.size, self.target_zoom_scale(), self.tile_size) {
            Some((x, y)) => {
                x.contains(self.state.target_offset.x, tolerance)
                    && y.contains(self.state.target_offset.y, tolerance)
            }
            None => true,
        }
    }
}
