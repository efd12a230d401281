//! The viewer session: one owned object per open window.
//!
//! A [`Viewer`] owns the viewport, the active tile snapshot and its cache,
//! the annotation store and the floating panels. Its lifecycle is
//! `create` → (`handle_event`* → `tick` → `render`)* → `destroy`.

use crate::core::bounds::TileBounds;
use crate::core::config::ViewerConfig;
use crate::core::geo::{Point, Size};
use crate::core::viewport::{Viewport, ViewportState};
use crate::input::events::{EventHandled, InputEvent};
use crate::input::handler::{Action, HandlerContext, InputHandler};
use crate::layers::marker::AnnotationStore;
use crate::rendering::compositor::{render_map, Crosshair, RenderOptions};
use crate::rendering::hud::{draw_scale_bar, HudReadout};
use crate::tiles::store::{LevelSwap, TileStore};
use crate::ui::panel::{PanelId, PanelKind};
use crate::ui::panels::{render_log_panel, LogLayout, PanelStack};
use crate::{Error, Result};
use image::{imageops, RgbaImage};

/// Pixels of a dragged panel that must stay inside the window
const PANEL_GRAB_MARGIN: f64 = 20.0;

/// Everything produced for one displayed frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Main view with the panels composited on top
    pub image: RgbaImage,
    pub center_world: Point,
    pub hud: HudReadout,
    /// Rows of the log panel, empty when there is none
    pub log: LogLayout,
    pub active_level: u32,
    pub zoom: f64,
    pub tiles_drawn: usize,
}

impl Frame {
    pub fn readout(&self) -> String {
        self.hud.coordinate_label()
    }

    /// Writes the composed image; the format follows the file extension
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        self.image.save(path.as_ref())?;
        Ok(())
    }
}

pub struct Viewer {
    config: ViewerConfig,
    viewport: Viewport,
    tiles: TileStore,
    annotations: AnnotationStore,
    panels: PanelStack,
    input: InputHandler,
    options: RenderOptions,
    pointer: Option<Point>,
    close_requested: bool,
    frame_count: u64,
}

impl Viewer {
    /// Validates `config`, loads the starting level and places the view at
    /// the start zoom.
    pub fn create(config: ViewerConfig, size: Size) -> Result<Self> {
        config.validate()?;
        if !(size.width > 0.0 && size.height > 0.0) {
            return Err(Error::InvalidCoordinates(format!(
                "viewport size must be positive, got {}x{}",
                size.width, size.height
            )));
        }

        let start_level = config.zoom.start_zoom.round().max(0.0) as u32;
        let tiles = TileStore::open(&config, start_level);
        let mut viewport = Viewport::new(&config, size, tiles.active_level())?;
        viewport.set_size(size, tiles.snapshot().bounds());
        viewport.settle();

        log::info!(
            "viewer created at level {} ({} tiles) for {}x{}",
            tiles.active_level(),
            tiles.snapshot().len(),
            size.width,
            size.height
        );

        Ok(Self {
            viewport,
            tiles,
            annotations: AnnotationStore::new(),
            panels: PanelStack::from_config(&config.panels),
            input: InputHandler::new(config.zoom.zoom_step),
            options: RenderOptions::from_config(&config.render),
            pointer: None,
            close_requested: false,
            frame_count: 0,
            config,
        })
    }

    /// Starts the session with previously recorded annotations
    pub fn with_annotations(mut self, annotations: AnnotationStore) -> Self {
        self.annotations = annotations;
        self
    }

    /// Ends the session and hands back the annotations
    pub fn destroy(self) -> AnnotationStore {
        log::info!(
            "viewer closed after {} frames with {} annotations",
            self.frame_count,
            self.annotations.len()
        );
        self.annotations
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn state(&self) -> &ViewportState {
        self.viewport.state()
    }

    pub fn tiles(&self) -> &TileStore {
        &self.tiles
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    pub fn panels(&self) -> &PanelStack {
        &self.panels
    }

    pub fn render_options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn typing(&self) -> Option<&str> {
        self.input.typing()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn should_close(&self) -> bool {
        self.close_requested
    }

    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    fn bounds(&self) -> Option<TileBounds> {
        self.tiles.snapshot().bounds().copied()
    }

    /// Minimap invert: the main toggle when linked, the panel's own otherwise
    pub fn minimap_inverted(&self) -> bool {
        if self.config.panels.linked_invert {
            return self.options.invert;
        }
        self.panels
            .iter()
            .find(|panel| matches!(panel.kind(), PanelKind::Minimap { .. }))
            .map(|panel| panel.invert)
            .unwrap_or(false)
    }

    fn log_layout(&self) -> LogLayout {
        match self.panels.log_panel() {
            Some(panel) => LogLayout::build(
                panel.rect(),
                &self.annotations,
                self.config.panels.log_row_height,
                self.config.panels.log_visible_rows,
                self.input.typing(),
            ),
            None => LogLayout::default(),
        }
    }

    fn context_for(&self, event: &InputEvent) -> HandlerContext {
        let mut context = HandlerContext {
            target_offset: self.viewport.state().target_offset,
            ..HandlerContext::default()
        };
        if let Some(position) = event.position() {
            context.panel = self.panels.topmost_at(&position);
            if context.panel.is_some() && context.panel == self.panels.log_panel().map(|p| p.id()) {
                context.log_entry = self.log_layout().hit_test(&position);
            }
        }
        context
    }

    /// Applies one input event to the targets, panels and annotations
    pub fn handle_event(&mut self, event: &InputEvent) -> EventHandled {
        if let InputEvent::PointerMove { position } = event {
            self.pointer = Some(*position);
        }
        let context = self.context_for(event);
        if let (InputEvent::PointerDown { .. }, Some(id)) = (event, context.panel) {
            self.panels.touch(id);
        }
        let (handled, actions) = self.input.handle_event(event, &context);
        for action in actions {
            self.apply(action);
        }
        handled
    }

    fn apply(&mut self, action: Action) {
        let bounds = self.bounds();
        match action {
            Action::PanTo { target_offset } => {
                let delta = target_offset.subtract(&self.viewport.state().target_offset);
                self.viewport.set_target_offset(delta, bounds.as_ref());
            }
            Action::Zoom { delta, anchor } => self.viewport.set_target_zoom(delta, anchor, bounds.as_ref()),
            Action::BeginPanelDrag { panel, pointer } => self.panels.begin_drag(panel, pointer),
            Action::DragPanel { pointer } => self.panels.drag_to(pointer),
            Action::EndPanelDrag => {
                let dragged = self.panels.dragging();
                self.panels.end_drag();
                self.keep_panel_visible(dragged);
            }
            Action::JumpToAnnotation { index } => {
                if let Err(e) = self.jump_to_annotation(index) {
                    log::warn!("cannot jump to annotation: {}", e);
                }
            }
            Action::CommitAnnotation { text } => {
                self.commit_annotation(text);
            }
            Action::ToggleInvert => {
                self.options.invert = !self.options.invert;
                log::debug!("invert {}", self.options.invert);
            }
            Action::ToggleMinimapInvert => {
                if self.config.panels.linked_invert {
                    log::debug!("minimap invert is linked to the main view");
                } else if let Some(minimap) = self.panels.minimap_mut() {
                    minimap.invert = !minimap.invert;
                }
            }
            Action::ToggleGrid => self.options.show_grid = !self.options.show_grid,
            Action::Resize { size } => self.resize(size),
            Action::Close => self.request_close(),
        }
    }

    fn keep_panel_visible(&mut self, id: Option<PanelId>) {
        let window = self.viewport.size();
        if let Some(panel) = id.and_then(|id| self.panels.get_mut(id)) {
            panel.keep_within(window, PANEL_GRAB_MARGIN);
        }
    }

    /// Pans the target by a screen-space delta
    pub fn pan(&mut self, delta: Point) {
        let bounds = self.bounds();
        self.viewport.set_target_offset(delta, bounds.as_ref());
    }

    /// Zooms the target by `delta` around a screen anchor
    pub fn zoom_at(&mut self, delta: f64, anchor: Point) {
        let bounds = self.bounds();
        self.viewport.set_target_zoom(delta, anchor, bounds.as_ref());
    }

    /// Points the view targets at annotation `index`
    pub fn jump_to_annotation(&mut self, index: usize) -> Result<()> {
        let bounds = self.bounds();
        let (offset, zoom) = self
            .annotations
            .recenter_target(
                index,
                &self.viewport,
                bounds.as_ref(),
                self.config.annotations.recenter_uses_stored_zoom,
            )
            .ok_or_else(|| {
                Error::InvalidCoordinates(format!(
                    "annotation {} does not exist ({} stored)",
                    index,
                    self.annotations.len()
                ))
            })?;
        self.viewport.set_target(offset, zoom, bounds.as_ref());
        log::debug!("jumping to annotation {} at zoom {:.2}", index, zoom);
        Ok(())
    }

    /// Records an annotation at the world point under the center crosshair
    pub fn commit_annotation(&mut self, text: impl Into<String>) -> usize {
        let world = self.viewport.center_world();
        let state = *self.viewport.state();
        self.annotations.commit(world, state.zoom, state.active_level, text)
    }

    pub fn resize(&mut self, size: Size) {
        if !(size.width > 0.0 && size.height > 0.0) {
            log::warn!("ignoring resize to {}x{}", size.width, size.height);
            return;
        }
        let bounds = self.bounds();
        self.viewport.set_size(size, bounds.as_ref());
        let ids: Vec<PanelId> = self.panels.iter().map(|panel| panel.id()).collect();
        for id in ids {
            self.keep_panel_visible(Some(id));
        }
    }

    /// Advances the animation by one frame
    pub fn tick(&mut self) -> LevelSwap {
        self.frame_count += 1;
        self.viewport.tick(&mut self.tiles)
    }

    /// Composes the main view, the HUD scale bar and every panel
    pub fn render(&mut self) -> Frame {
        let size = self.viewport.size();
        let transform = self.viewport.transform();
        let log = self.log_layout();
        let minimap_invert = self.minimap_inverted();
        let hovered = self.pointer.and_then(|pointer| log.hit_test(&pointer));

        let (snapshot, cache) = self.tiles.parts_mut();
        let main = render_map(snapshot, cache, &transform, size, &self.annotations, &self.options);
        let mut image = main.image;

        let hud = HudReadout::new(main.center_world, self.viewport.state().zoom, transform.tile_pixels(), size);
        draw_scale_bar(&mut image, &hud.scale_bar);

        for id in self.panels.draw_order() {
            let Some(panel) = self.panels.get(id) else {
                continue;
            };
            let content = match panel.map_transform(&transform, size) {
                Some(mini) => {
                    let options = self
                        .options
                        .clone()
                        .with_invert(minimap_invert)
                        .with_crosshair(Crosshair::Reticle);
                    render_map(snapshot, cache, &mini, panel.size(), &self.annotations, &options).image
                }
                None => render_log_panel(panel, &log, hovered),
            };
            let origin = panel.rect().origin().floor();
            imageops::replace(&mut image, &content, origin.x as i64, origin.y as i64);
        }

        Frame {
            image,
            center_world: main.center_world,
            hud,
            log,
            active_level: self.viewport.state().active_level,
            zoom: self.viewport.state().zoom,
            tiles_drawn: main.tiles_drawn,
        }
    }
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("state", self.viewport.state())
            .field("size", &self.viewport.size())
            .field("tiles", &self.tiles.snapshot().len())
            .field("annotations", &self.annotations.len())
            .field("panels", &self.panels.len())
            .field("frame_count", &self.frame_count)
            .finish()
    }
}
