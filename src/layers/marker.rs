use crate::core::bounds::TileBounds;
use crate::core::geo::Point;
use crate::core::viewport::{ViewTransform, Viewport};
use serde::{Deserialize, Serialize};

/// A user annotation pinned to a world coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub world_x: f64,
    pub world_y: f64,
    pub zoom_at_creation: f64,
    /// Pyramid level whose tile units `world_x`/`world_y` are measured in
    pub level_at_creation: u32,
    pub text: String,
}

impl Marker {
    pub fn new(world: Point, zoom_at_creation: f64, level_at_creation: u32, text: impl Into<String>) -> Self {
        Self {
            world_x: world.x,
            world_y: world.y,
            zoom_at_creation,
            level_at_creation,
            text: text.into(),
        }
    }

    pub fn world(&self) -> Point {
        Point::new(self.world_x, self.world_y)
    }

    /// The marker position in tile units of `level`
    pub fn world_at_level(&self, level: u32) -> Point {
        let factor = 2_f64.powi(level as i32 - self.level_at_creation as i32);
        self.world().multiply(factor)
    }

    pub fn screen_position(&self, transform: &ViewTransform) -> Point {
        transform.world_to_screen(self.world_at_level(transform.level))
    }

    /// Target offset and zoom that put this marker under the view center.
    ///
    /// With `use_stored_zoom` the view returns to the zoom the marker was
    /// recorded at, otherwise it keeps its current target zoom.
    pub fn recenter_target(
        &self,
        viewport: &Viewport,
        bounds: Option<&TileBounds>,
        use_stored_zoom: bool,
    ) -> (Point, f64) {
        let zoom = if use_stored_zoom {
            self.zoom_at_creation
        } else {
            viewport.state().target_zoom
        };
        let (min_zoom, max_zoom) = viewport.zoom_limits();
        let zoom = zoom.clamp(min_zoom, max_zoom);
        let world = self.world_at_level(viewport.state().active_level);
        (viewport.centering_offset(world, zoom, bounds), zoom)
    }

    /// One-line summary used by the log panel
    pub fn label(&self) -> String {
        format!("X:{:.2} Y:{:.2} {}", self.world_x, self.world_y, self.text)
    }
}

/// Insertion-ordered annotation list.
///
/// Entries are never removed or edited once committed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationStore {
    entries: Vec<Marker>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an annotation and returns its index
    pub fn commit(&mut self, world: Point, zoom_at_creation: f64, level_at_creation: u32, text: impl Into<String>) -> usize {
        let marker = Marker::new(world, zoom_at_creation, level_at_creation, text);
        log::info!(
            "annotation #{} at ({:.2}, {:.2}) zoom {:.2}: {:?}",
            self.entries.len(),
            marker.world_x,
            marker.world_y,
            marker.zoom_at_creation,
            marker.text
        );
        self.entries.push(marker);
        self.entries.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Marker> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[Marker] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.entries.iter()
    }

    /// Index of the first entry shown when only the last `count` fit
    pub fn tail_start(&self, count: usize) -> usize {
        self.entries.len().saturating_sub(count)
    }

    /// Target state for re-centering on entry `index`, if it exists
    pub fn recenter_target(
        &self,
        index: usize,
        viewport: &Viewport,
        bounds: Option<&TileBounds>,
        use_stored_zoom: bool,
    ) -> Option<(Point, f64)> {
        self.get(index)
            .map(|marker| marker.recenter_target(viewport, bounds, use_stored_zoom))
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ViewerConfig;
    use crate::core::geo::Size;

    fn bounds() -> TileBounds {
        TileBounds {
            min_col: 0,
            max_col: 63,
            min_row: 0,
            max_row: 63,
        }
    }

    #[test]
    fn test_commit_keeps_insertion_order_and_duplicates() {
        let mut store = AnnotationStore::new();
        assert_eq!(store.commit(Point::new(1.0, 2.0), 2.0, 2, "first"), 0);
        assert_eq!(store.commit(Point::new(1.0, 2.0), 2.0, 2, "first"), 1);
        assert_eq!(store.commit(Point::new(3.0, 4.0), 3.5, 3, ""), 2);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(0), store.get(1));
        assert_eq!(store.get(2).unwrap().text, "");
        assert!(store.get(3).is_none());
    }

    #[test]
    fn test_world_at_other_levels() {
        let marker = Marker::new(Point::new(12.5, 7.25), 3.0, 3, "ridge");
        assert_eq!(marker.world_at_level(3), Point::new(12.5, 7.25));
        assert_eq!(marker.world_at_level(4), Point::new(25.0, 14.5));
        assert_eq!(marker.world_at_level(2), Point::new(6.25, 3.625));
    }

    #[test]
    fn test_recenter_with_stored_zoom() {
        let viewport = Viewport::new(&ViewerConfig::default(), Size::new(800.0, 600.0), 2).unwrap();
        let marker = Marker::new(Point::new(12.5, 7.25), 3.0, 2, "camp");
        let (offset, zoom) = marker.recenter_target(&viewport, Some(&bounds()), true);
        assert_eq!(zoom, 3.0);
        // Scale 2 at level 2 puts one tile at 512 px.
        assert_eq!(offset, Point::new(400.0 - 12.5 * 512.0, 300.0 - 7.25 * 512.0));
    }

    #[test]
    fn test_recenter_keeps_current_zoom() {
        let viewport = Viewport::new(&ViewerConfig::default(), Size::new(800.0, 600.0), 2).unwrap();
        let marker = Marker::new(Point::new(12.5, 7.25), 4.0, 2, "camp");
        let (offset, zoom) = marker.recenter_target(&viewport, Some(&bounds()), false);
        assert_eq!(zoom, 2.0);
        assert_eq!(offset, Point::new(400.0 - 12.5 * 256.0, 300.0 - 7.25 * 256.0));
    }

    #[test]
    fn test_store_serializes_as_list() {
        let mut store = AnnotationStore::new();
        store.commit(Point::new(0.5, 0.25), 2.0, 2, "a");
        let json = store.to_json().unwrap();
        assert!(json.trim_start().starts_with('['));
        assert_eq!(AnnotationStore::from_json(&json).unwrap(), store);
        assert_eq!(store.get(0).unwrap().label(), "X:0.50 Y:0.25 a");
    }
}
