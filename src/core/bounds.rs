//! Tile index bounds, screen rectangles and the pan clamp.

use crate::core::geo::{Point, Size, TileIndex};
use serde::{Deserialize, Serialize};

/// Inclusive column/row range covered by a pyramid snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileBounds {
    pub min_col: i32,
    pub max_col: i32,
    pub min_row: i32,
    pub max_row: i32,
}

impl TileBounds {
    /// Bounds covering a single tile
    pub fn from_index(index: TileIndex) -> Self {
        Self {
            min_col: index.col,
            max_col: index.col,
            min_row: index.row,
            max_row: index.row,
        }
    }

    /// Smallest bounds covering every index, or `None` for an empty iterator
    pub fn from_indices<I>(indices: I) -> Option<Self>
    where
        I: IntoIterator<Item = TileIndex>,
    {
        let mut iter = indices.into_iter();
        let mut bounds = Self::from_index(iter.next()?);
        for index in iter {
            bounds.extend(index);
        }
        Some(bounds)
    }

    /// Extends the bounds to include an index
    pub fn extend(&mut self, index: TileIndex) {
        self.min_col = self.min_col.min(index.col);
        self.max_col = self.max_col.max(index.col);
        self.min_row = self.min_row.min(index.row);
        self.max_row = self.max_row.max(index.row);
    }

    pub fn contains(&self, index: TileIndex) -> bool {
        index.col >= self.min_col
            && index.col <= self.max_col
            && index.row >= self.min_row
            && index.row <= self.max_row
    }

    pub fn columns(&self) -> u64 {
        (self.max_col as i64 - self.min_col as i64 + 1) as u64
    }

    pub fn rows(&self) -> u64 {
        (self.max_row as i64 - self.min_row as i64 + 1) as u64
    }
}

/// Axis-aligned rectangle in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Half-open containment: the right and bottom edges are outside
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    /// Returns the rectangle moved so its origin sits at `origin`
    pub fn moved_to(&self, origin: Point) -> Rect {
        Rect::new(origin.x, origin.y, self.width, self.height)
    }

    /// Converts a screen point into this rectangle's local coordinates
    pub fn to_local(&self, point: &Point) -> Point {
        point.subtract(&self.origin())
    }
}

/// Permitted offset interval on one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetRange {
    pub min: f64,
    pub max: f64,
}

impl OffsetRange {
    /// True when the map is smaller than the viewport on this axis
    pub fn is_degenerate(&self) -> bool {
        self.min > self.max
    }

    /// Resolves a candidate offset into the range. A degenerate range pins the
    /// map centered on the axis.
    pub fn resolve(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            (self.min + self.max) / 2.0
        } else {
            value.clamp(self.min, self.max)
        }
    }

    pub fn contains(&self, value: f64, tolerance: f64) -> bool {
        if self.is_degenerate() {
            (value - (self.min + self.max) / 2.0).abs() <= tolerance
        } else {
            value >= self.min - tolerance && value <= self.max + tolerance
        }
    }
}

fn axis_range(min_index: i32, max_index: i32, extent: f64, tile_px: f64) -> OffsetRange {
    OffsetRange {
        min: extent - (max_index as f64 + 1.0) * tile_px,
        max: -(min_index as f64) * tile_px,
    }
}

/// Offset ranges per axis for the given bounds, or `None` when unconstrained
pub fn offset_ranges(
    bounds: Option<&TileBounds>,
    viewport: Size,
    zoom_scale: f64,
    tile_size: u32,
) -> Option<(OffsetRange, OffsetRange)> {
    let bounds = bounds?;
    let tile_px = tile_size as f64 * zoom_scale;
    if !(tile_px.is_finite() && tile_px > 0.0) {
        return None;
    }
    Some((
        axis_range(bounds.min_col, bounds.max_col, viewport.width, tile_px),
        axis_range(bounds.min_row, bounds.max_row, viewport.height, tile_px),
    ))
}

/// Constrains a candidate offset so the rendered pyramid cannot be panned off
/// screen. Empty pyramids leave the offset untouched.
pub fn clamp_offset(
    offset: Point,
    bounds: Option<&TileBounds>,
    viewport: Size,
    zoom_scale: f64,
    tile_size: u32,
) -> Point {
    match offset_ranges(bounds, viewport, zoom_scale, tile_size) {
        Some((x_range, y_range)) => {
            Point::new(x_range.resolve(offset.x), y_range.resolve(offset.y))
        }
        None => offset,
    }
}
