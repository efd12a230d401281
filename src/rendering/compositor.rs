use crate::core::config::{Color, RenderConfig};
use crate::core::geo::{Point, Size};
use crate::core::viewport::ViewTransform;
use crate::layers::marker::AnnotationStore;
use crate::rendering::filters;
use crate::tiles::{PyramidSnapshot, ScaledTileCache};
use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut,
    draw_polygon_mut,
};
use imageproc::rect::Rect as PixelRect;

/// Marker diamond half-diagonal in pixels
const MARKER_RADIUS: i32 = 5;
/// Minimap reticle arm length and ring radius
const RETICLE_ARM: i32 = 10;
const RETICLE_RING: i32 = 12;

/// Overlay drawn at the center of a view after post-processing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Crosshair {
    None,
    /// Square outline of the given half extent
    Bracket { half_extent: u32 },
    /// Small cross inside a circle, used by the minimap
    Reticle,
}

/// Per-view switches for one [`render_map`] call
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub background: Color,
    pub missing_tile: Color,
    pub grid_color: Color,
    pub marker_color: Color,
    pub crosshair_color: Color,
    pub show_grid: bool,
    pub show_markers: bool,
    pub invert: bool,
    pub dash_length: u32,
    pub crosshair: Crosshair,
}

impl RenderOptions {
    /// Options for the main view
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            background: config.background,
            missing_tile: config.missing_tile,
            grid_color: config.grid_color,
            marker_color: config.marker_color,
            crosshair_color: config.crosshair_color,
            show_grid: config.show_grid,
            show_markers: config.show_markers,
            invert: config.invert,
            dash_length: config.dash_length,
            crosshair: if config.show_crosshair {
                Crosshair::Bracket {
                    half_extent: config.crosshair_half_extent,
                }
            } else {
                Crosshair::None
            },
        }
    }

    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn with_crosshair(mut self, crosshair: Crosshair) -> Self {
        self.crosshair = crosshair;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

/// Output of one composition pass
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub image: RgbaImage,
    /// World coordinate under the view center
    pub center_world: Point,
    pub tiles_drawn: usize,
    pub missing_cells: usize,
}

impl RenderedFrame {
    /// `X:.. Y:..` readout of the center coordinate
    pub fn readout(&self) -> String {
        format!("X:{:.2} Y:{:.2}", self.center_world.x, self.center_world.y)
    }
}

/// Composes one view of `snapshot` into a new image of `size`.
///
/// Order: background, tiles (missing cells inside the bounds get the
/// missing-tile color), dotted grid, annotation markers, optional
/// invert+grayscale, crosshair. The crosshair is drawn after the filter so it
/// keeps its color.
pub fn render_map(
    snapshot: &PyramidSnapshot,
    cache: &mut ScaledTileCache,
    transform: &ViewTransform,
    size: Size,
    annotations: &AnnotationStore,
    options: &RenderOptions,
) -> RenderedFrame {
    let (width, height) = size.pixels();
    let mut image = RgbaImage::from_pixel(width, height, Rgba(options.background));
    let mut tiles_drawn = 0;
    let mut missing_cells = 0;

    // A cache filled from another snapshot must not be read.
    cache.bind(snapshot.generation());

    let range = transform.visible_tile_range(snapshot.bounds(), size);
    if let Some(range) = range {
        for index in range.iter() {
            // Cells run from this tile's floored origin to the next one's, so
            // neighbors share edges exactly.
            let origin = transform.tile_origin(index).floor();
            let next = transform
                .world_to_screen(Point::new(index.col as f64 + 1.0, index.row as f64 + 1.0))
                .floor();
            let (x, y) = (origin.x as i64, origin.y as i64);
            let (cell_w, cell_h) = ((next.x - origin.x) as i64, (next.y - origin.y) as i64);
            match snapshot.get(index) {
                Some(tile) => {
                    let scaled = cache.get(index, tile, transform.scale);
                    blit_tile(&mut image, &scaled, x, y, cell_w, cell_h);
                    tiles_drawn += 1;
                }
                None => {
                    if let Some(rect) = filters::clip_rect(&image, x, y, cell_w, cell_h) {
                        draw_filled_rect_mut(&mut image, rect, Rgba(options.missing_tile));
                    }
                    missing_cells += 1;
                }
            }
        }

        if options.show_grid {
            let (w, h) = (width as f32, height as f32);
            for col in range.min_col as i64..=range.max_col as i64 + 1 {
                let x = transform.world_to_screen(Point::new(col as f64, 0.0)).x.floor() as f32;
                filters::draw_dashed_line_segment_mut(
                    &mut image,
                    (x, 0.0),
                    (x, h),
                    options.dash_length,
                    options.grid_color,
                );
            }
            for row in range.min_row as i64..=range.max_row as i64 + 1 {
                let y = transform.world_to_screen(Point::new(0.0, row as f64)).y.floor() as f32;
                filters::draw_dashed_line_segment_mut(
                    &mut image,
                    (0.0, y),
                    (w, y),
                    options.dash_length,
                    options.grid_color,
                );
            }
        }
    }

    if options.show_markers {
        draw_markers(&mut image, transform, annotations, options.marker_color);
    }

    if options.invert {
        filters::invert_grayscale(&mut image);
    }

    draw_crosshair(&mut image, options.crosshair, options.crosshair_color);

    log::trace!(
        "rendered {}x{} at scale {:.3}: {} tiles, {} missing cells",
        width,
        height,
        transform.scale,
        tiles_drawn,
        missing_cells
    );

    RenderedFrame {
        image,
        center_world: transform.screen_to_world(size.center()),
        tiles_drawn,
        missing_cells,
    }
}

/// Places `tile` in the `width × height` cell at `(x, y)`, cropping any
/// excess. A tile short of its cell has its last column and row repeated.
fn blit_tile(image: &mut RgbaImage, tile: &RgbaImage, x: i64, y: i64, width: i64, height: i64) {
    let (tw, th) = (tile.width() as i64, tile.height() as i64);
    if width <= 0 || height <= 0 || tw == 0 || th == 0 {
        return;
    }
    let (cw, ch) = (tw.min(width), th.min(height));
    imageops::overlay(image, &*imageops::crop_imm(tile, 0, 0, cw as u32, ch as u32), x, y);

    let last_col = imageops::crop_imm(tile, tw as u32 - 1, 0, 1, ch as u32);
    for dx in cw..width {
        imageops::overlay(image, &*last_col, x + dx, y);
    }
    let last_row = imageops::crop_imm(tile, 0, th as u32 - 1, cw as u32, 1);
    for dy in ch..height {
        imageops::overlay(image, &*last_row, x, y + dy);
    }
    if width > cw && height > ch {
        let corner = *tile.get_pixel(tw as u32 - 1, th as u32 - 1);
        if let Some(rect) = filters::clip_rect(image, x + cw, y + ch, width - cw, height - ch) {
            draw_filled_rect_mut(image, rect, corner);
        }
    }
}

fn draw_markers(image: &mut RgbaImage, transform: &ViewTransform, annotations: &AnnotationStore, color: Color) {
    let (w, h) = (image.width() as f64, image.height() as f64);
    let margin = MARKER_RADIUS as f64;
    for marker in annotations.iter() {
        let p = marker.screen_position(transform);
        if !p.is_finite() || p.x < -margin || p.y < -margin || p.x > w + margin || p.y > h + margin {
            continue;
        }
        let (cx, cy) = (p.x.round() as i32, p.y.round() as i32);
        let diamond = [
            imageproc::point::Point::new(cx, cy - MARKER_RADIUS),
            imageproc::point::Point::new(cx + MARKER_RADIUS, cy),
            imageproc::point::Point::new(cx, cy + MARKER_RADIUS),
            imageproc::point::Point::new(cx - MARKER_RADIUS, cy),
        ];
        draw_polygon_mut(image, &diamond, Rgba(color));
    }
}

fn draw_crosshair(image: &mut RgbaImage, crosshair: Crosshair, color: Color) {
    let (cx, cy) = (image.width() as i32 / 2, image.height() as i32 / 2);
    let color = Rgba(color);
    match crosshair {
        Crosshair::None => {}
        Crosshair::Bracket { half_extent } => {
            let half = half_extent.min(i16::MAX as u32) as i32;
            let side = 2 * half as u32 + 1;
            // Two nested outlines give a two pixel stroke.
            for inset in 0..2 {
                let square = PixelRect::at(cx - half - inset, cy - half - inset).of_size(side, side);
                draw_hollow_rect_mut(image, square, color);
            }
        }
        Crosshair::Reticle => {
            let (cxf, cyf, arm) = (cx as f32, cy as f32, RETICLE_ARM as f32);
            for shift in [0.0, 1.0] {
                draw_line_segment_mut(image, (cxf - arm, cyf - shift), (cxf + arm, cyf - shift), color);
                draw_line_segment_mut(image, (cxf - shift, cyf - arm), (cxf - shift, cyf + arm), color);
            }
            draw_hollow_circle_mut(image, (cx, cy), RETICLE_RING, color);
        }
    }
}
