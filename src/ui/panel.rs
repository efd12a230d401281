use crate::core::bounds::Rect;
use crate::core::geo::{Point, Size};
use crate::core::viewport::ViewTransform;
use serde::{Deserialize, Serialize};

/// Stable identifier of a panel inside a [`PanelStack`](super::panels::PanelStack)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PanelId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PanelKind {
    /// Overview of the main view, `zoom_out` zoom levels further out
    Minimap { zoom_out: f64 },
    /// Annotation list
    Log,
}

/// A secondary surface with its own screen rectangle.
///
/// Dragging moves the rectangle only; the main view state is never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingPanel {
    id: PanelId,
    kind: PanelKind,
    rect: Rect,
    /// Pointer position relative to the panel origin while dragged
    drag_anchor: Option<Point>,
    /// Invert toggle used when the panel is not linked to the main view
    pub invert: bool,
}

impl FloatingPanel {
    pub fn new(id: PanelId, kind: PanelKind, rect: Rect) -> Self {
        Self {
            id,
            kind,
            rect,
            drag_anchor: None,
            invert: false,
        }
    }

    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn kind(&self) -> PanelKind {
        self.kind
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn size(&self) -> Size {
        self.rect.size()
    }

    pub fn contains(&self, point: &Point) -> bool {
        self.rect.contains(point)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    pub fn begin_drag(&mut self, pointer: Point) {
        self.drag_anchor = Some(self.rect.to_local(&pointer));
    }

    /// Moves the panel so the grabbed point follows `pointer`
    pub fn drag_to(&mut self, pointer: Point) {
        if let Some(anchor) = self.drag_anchor {
            self.rect = self.rect.moved_to(pointer.subtract(&anchor));
        }
    }

    pub fn end_drag(&mut self) {
        self.drag_anchor = None;
    }

    /// Keeps at least `margin` pixels of the panel inside a window
    pub fn keep_within(&mut self, window: Size, margin: f64) {
        let x = self
            .rect
            .x
            .clamp(margin - self.rect.width, (window.width - margin).max(margin - self.rect.width));
        let y = self
            .rect
            .y
            .clamp(0.0, (window.height - margin).max(0.0));
        self.rect = self.rect.moved_to(Point::new(x, y));
    }

    /// The transform the panel renders its content with, if it shows the map
    pub fn map_transform(&self, main: &ViewTransform, main_size: Size) -> Option<ViewTransform> {
        match self.kind {
            PanelKind::Minimap { zoom_out } => Some(minimap_transform(main, main_size, self.size(), zoom_out)),
            PanelKind::Log => None,
        }
    }
}

/// A view centered on the same world point as `main`, zoomed out by
/// `zoom_out` levels, for a surface of `panel_size`.
pub fn minimap_transform(main: &ViewTransform, main_size: Size, panel_size: Size, zoom_out: f64) -> ViewTransform {
    let center_world = main.screen_to_world(main_size.center());
    let scale = main.scale * 2_f64.powf(-zoom_out);
    let tile_px = main.tile_size as f64 * scale;
    let center = panel_size.center();
    ViewTransform {
        offset: Point::new(center.x - center_world.x * tile_px, center.y - center_world.y * tile_px),
        scale,
        tile_size: main.tile_size,
        level: main.level,
    }
}
