//! Helpers on top of `imageproc::drawing` and the post-processing pass over
//! composed frames.

use crate::core::config::Color;
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
use imageproc::rect::Rect as PixelRect;

/// The part of `[x, x + width) × [y, y + height)` that lies on `image`, as a
/// rectangle imageproc can draw. `None` when nothing is left.
pub fn clip_rect(image: &RgbaImage, x: i64, y: i64, width: i64, height: i64) -> Option<PixelRect> {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = x.saturating_add(width).min(image.width() as i64);
    let y1 = y.saturating_add(height).min(image.height() as i64);
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some(PixelRect::at(x0 as i32, y0 as i32).of_size((x1 - x0) as u32, (y1 - y0) as u32))
}

/// Dashed segment from `start` toward `end` (exclusive): `dash` pixels drawn,
/// `dash` pixels skipped
pub fn draw_dashed_line_segment_mut(
    image: &mut RgbaImage,
    start: (f32, f32),
    end: (f32, f32),
    dash: u32,
    color: Color,
) {
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let length = dx.hypot(dy);
    if !(length >= 1.0) {
        return;
    }
    let (ux, uy) = (dx / length, dy / length);
    let dash = dash.max(1) as f32;
    let mut t = 0.0;
    while t < length {
        let stop = (t + dash).min(length) - 1.0;
        draw_line_segment_mut(
            image,
            (start.0 + ux * t, start.1 + uy * t),
            (start.0 + ux * stop, start.1 + uy * stop),
            Rgba(color),
        );
        t += dash * 2.0;
    }
}

/// Color-invert then desaturate, in place. Alpha is left untouched.
pub fn invert_grayscale(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let sum = (255 - r) as u16 + (255 - g) as u16 + (255 - b) as u16;
        let gray = (sum / 3) as u8;
        *pixel = Rgba([gray, gray, gray, a]);
    }
}
