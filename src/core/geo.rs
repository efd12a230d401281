use serde::{Deserialize, Serialize};

/// Represents a point in screen or world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn floor(&self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }

    /// Checks that both components are finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Pixel dimensions of a rendering surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The surface center in local pixel coordinates
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Integer pixel dimensions, never smaller than 1x1
    pub fn pixels(&self) -> (u32, u32) {
        (
            self.width.round().max(1.0) as u32,
            self.height.round().max(1.0) as u32,
        )
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// Column/row address of a tile inside one pyramid level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileIndex {
    pub col: i32,
    pub row: i32,
}

impl TileIndex {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }
}

impl std::fmt::Display for TileIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.col, self.row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_arithmetic() {
        let a = Point::new(3.0, 4.0);
        let b = Point::new(1.0, 1.0);
        assert_eq!(a.add(&b), Point::new(4.0, 5.0));
        assert_eq!(a.subtract(&b), Point::new(2.0, 3.0));
        assert_eq!(a.multiply(2.0), Point::new(6.0, 8.0));
        assert_eq!(Point::default().distance_to(&a), 5.0);
    }

    #[test]
    fn test_size_pixels_never_zero() {
        assert_eq!(Size::new(0.2, 0.0).pixels(), (1, 1));
        assert_eq!(Size::new(800.4, 599.6).pixels(), (800, 600));
        assert_eq!(Size::new(800.0, 600.0).center(), Point::new(400.0, 300.0));
    }

    #[test]
    fn test_tile_index_ordering() {
        let mut indices = vec![TileIndex::new(1, 0), TileIndex::new(0, 3), TileIndex::new(0, 1)];
        indices.sort();
        assert_eq!(indices[0], TileIndex::new(0, 1));
        assert_eq!(TileIndex::new(-2, 7).to_string(), "-2,7");
    }
}
