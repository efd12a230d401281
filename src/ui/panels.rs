use crate::core::bounds::Rect;
use crate::core::config::{Color, PanelConfig};
use crate::core::geo::Point;
use crate::layers::marker::AnnotationStore;
use crate::rendering::filters;
use crate::ui::panel::{FloatingPanel, PanelId, PanelKind};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use serde::Serialize;

const LOG_BACKDROP: Color = [20, 20, 20, 255];
const LOG_ROW_STRIPE: Color = [35, 35, 35, 255];
const LOG_HIGHLIGHT: Color = [60, 60, 90, 255];
const LOG_TOP_PADDING: f64 = 5.0;
const LOG_LEFT_PADDING: f64 = 5.0;

/// Floating panels in creation order plus the most recently used one.
#[derive(Debug, Clone, Default)]
pub struct PanelStack {
    panels: Vec<FloatingPanel>,
    last_interacted: Option<PanelId>,
    dragging: Option<PanelId>,
}

impl PanelStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimap and log panel as laid out by `config`, or nothing when panels
    /// are disabled
    pub fn from_config(config: &PanelConfig) -> Self {
        let mut stack = Self::new();
        if config.enabled {
            stack.push(
                PanelKind::Minimap {
                    zoom_out: config.minimap_zoom_out,
                },
                config.minimap_rect,
            );
            stack.push(PanelKind::Log, config.log_rect);
        }
        stack
    }

    pub fn push(&mut self, kind: PanelKind, rect: Rect) -> PanelId {
        let id = PanelId(self.panels.len());
        self.panels.push(FloatingPanel::new(id, kind, rect));
        id
    }

    pub fn get(&self, id: PanelId) -> Option<&FloatingPanel> {
        self.panels.get(id.0)
    }

    pub fn get_mut(&mut self, id: PanelId) -> Option<&mut FloatingPanel> {
        self.panels.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn log_panel(&self) -> Option<&FloatingPanel> {
        self.panels.iter().find(|panel| panel.kind() == PanelKind::Log)
    }

    pub fn minimap_mut(&mut self) -> Option<&mut FloatingPanel> {
        self.panels
            .iter_mut()
            .find(|panel| matches!(panel.kind(), PanelKind::Minimap { .. }))
    }

    pub fn last_interacted(&self) -> Option<PanelId> {
        self.last_interacted
    }

    /// Marks a panel as the most recently used one, raising it to the top
    pub fn touch(&mut self, id: PanelId) {
        if self.get(id).is_some() {
            self.last_interacted = Some(id);
        }
    }

    /// Bottom-to-top drawing order
    pub fn draw_order(&self) -> Vec<PanelId> {
        let mut order: Vec<PanelId> = self
            .panels
            .iter()
            .map(FloatingPanel::id)
            .filter(|id| Some(*id) != self.last_interacted)
            .collect();
        order.extend(self.last_interacted);
        order
    }

    /// Topmost panel under `point`
    pub fn topmost_at(&self, point: &Point) -> Option<PanelId> {
        self.draw_order()
            .into_iter()
            .rev()
            .find(|id| self.panels[id.0].contains(point))
    }

    pub fn begin_drag(&mut self, id: PanelId, pointer: Point) {
        if let Some(panel) = self.get_mut(id) {
            panel.begin_drag(pointer);
            self.dragging = Some(id);
            self.touch(id);
        }
    }

    pub fn drag_to(&mut self, pointer: Point) {
        if let Some(id) = self.dragging {
            if let Some(panel) = self.get_mut(id) {
                panel.drag_to(pointer);
            }
        }
    }

    pub fn end_drag(&mut self) {
        if let Some(id) = self.dragging.take() {
            if let Some(panel) = self.get_mut(id) {
                panel.end_drag();
            }
        }
    }

    pub fn dragging(&self) -> Option<PanelId> {
        self.dragging
    }

    pub fn iter(&self) -> impl Iterator<Item = &FloatingPanel> {
        self.panels.iter()
    }
}

/// One row of the log panel in screen coordinates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogLine {
    /// Annotation index, `None` for the typing prompt
    pub index: Option<usize>,
    pub text: String,
    pub rect: Rect,
}

/// Rows of the log panel: the most recent annotations, then the typing
/// prompt while a note is being written.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LogLayout {
    pub lines: Vec<LogLine>,
}

impl LogLayout {
    pub fn build(
        panel: Rect,
        annotations: &AnnotationStore,
        row_height: f64,
        visible_rows: usize,
        typing: Option<&str>,
    ) -> Self {
        let start = annotations.tail_start(visible_rows);
        let row = |slot: usize| {
            Rect::new(
                panel.x + LOG_LEFT_PADDING,
                panel.y + LOG_TOP_PADDING + slot as f64 * row_height,
                (panel.width - LOG_LEFT_PADDING).max(0.0),
                row_height,
            )
        };

        let mut lines: Vec<LogLine> = annotations.entries()[start..]
            .iter()
            .enumerate()
            .map(|(slot, marker)| LogLine {
                index: Some(start + slot),
                text: marker.label(),
                rect: row(slot),
            })
            .collect();

        if let Some(text) = typing {
            let text = if text.is_empty() {
                "Write comment".to_string()
            } else {
                format!("> {}", text)
            };
            lines.push(LogLine {
                index: None,
                text,
                rect: row(lines.len()),
            });
        }
        Self { lines }
    }

    /// Annotation index of the row under `point`
    pub fn hit_test(&self, point: &Point) -> Option<usize> {
        self.lines
            .iter()
            .find(|line| line.rect.contains(point))
            .and_then(|line| line.index)
    }
}

/// Draws the log panel backdrop with one stripe per row; row text is left to
/// the embedding surface.
pub fn render_log_panel(panel: &FloatingPanel, layout: &LogLayout, hovered: Option<usize>) -> RgbaImage {
    let (width, height) = panel.size().pixels();
    let mut image = RgbaImage::from_pixel(width, height, Rgba(LOG_BACKDROP));
    for (slot, line) in layout.lines.iter().enumerate() {
        let local = Rect::from_origin_size(panel.rect().to_local(&line.rect.origin()), line.rect.size());
        let color = if line.index.is_some() && line.index == hovered {
            LOG_HIGHLIGHT
        } else if slot % 2 == 0 {
            LOG_ROW_STRIPE
        } else {
            continue;
        };
        let stripe = filters::clip_rect(
            &image,
            local.x.floor() as i64,
            local.y.floor() as i64,
            local.width.ceil() as i64,
            local.height.ceil() as i64,
        );
        if let Some(stripe) = stripe {
            draw_filled_rect_mut(&mut image, stripe, Rgba(color));
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> PanelStack {
        PanelStack::from_config(&PanelConfig {
            enabled: true,
            minimap_rect: Rect::new(0.0, 0.0, 100.0, 100.0),
            log_rect: Rect::new(50.0, 50.0, 100.0, 100.0),
            ..PanelConfig::default()
        })
    }

    #[test]
    fn test_disabled_config_has_no_panels() {
        assert!(PanelStack::from_config(&PanelConfig::default()).is_empty());
    }

    #[test]
    fn test_last_interacted_is_drawn_on_top() {
        let mut stack = stack();
        let overlap = Point::new(75.0, 75.0);
        assert_eq!(stack.draw_order(), vec![PanelId(0), PanelId(1)]);
        assert_eq!(stack.topmost_at(&overlap), Some(PanelId(1)));

        stack.touch(PanelId(0));
        assert_eq!(stack.draw_order(), vec![PanelId(1), PanelId(0)]);
        assert_eq!(stack.topmost_at(&overlap), Some(PanelId(0)));
        assert_eq!(stack.topmost_at(&Point::new(500.0, 500.0)), None);
    }

    #[test]
    fn test_stack_drag_raises_panel() {
        let mut stack = stack();
        stack.begin_drag(PanelId(0), Point::new(10.0, 10.0));
        stack.drag_to(Point::new(210.0, 10.0));
        stack.end_drag();
        assert_eq!(stack.get(PanelId(0)).unwrap().rect().origin(), Point::new(200.0, 0.0));
        assert_eq!(stack.last_interacted(), Some(PanelId(0)));
        assert_eq!(stack.dragging(), None);
    }

    #[test]
    fn test_log_layout_rows_and_hits() {
        let mut store = AnnotationStore::new();
        for i in 0..35 {
            store.commit(Point::new(i as f64, 1.0), 2.0, 2, format!("n{}", i));
        }
        let panel = Rect::new(500.0, 0.0, 300.0, 700.0);
        let layout = LogLayout::build(panel, &store, 20.0, 30, Some(""));
        assert_eq!(layout.lines.len(), 31);
        assert_eq!(layout.lines[0].index, Some(5));
        assert_eq!(layout.lines[0].text, "X:5.00 Y:1.00 n5");
        assert_eq!(layout.lines[30].text, "Write comment");

        assert_eq!(layout.hit_test(&Point::new(510.0, 6.0)), Some(5));
        assert_eq!(layout.hit_test(&Point::new(510.0, 25.0)), Some(6));
        assert_eq!(layout.hit_test(&Point::new(510.0, 2.0)), None);
        // Prompt row is not an annotation.
        assert_eq!(layout.hit_test(&Point::new(510.0, 5.0 + 30.0 * 20.0 + 1.0)), None);
    }

    #[test]
    fn test_log_prompt_echoes_text() {
        let layout = LogLayout::build(Rect::new(0.0, 0.0, 100.0, 100.0), &AnnotationStore::new(), 20.0, 30, Some("hi"));
        assert_eq!(layout.lines[0].text, "> hi");
    }
}
