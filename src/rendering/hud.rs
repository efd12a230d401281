//! Heads-up readouts derived from the view state.
//!
//! Text is left to the embedding surface; only the scale bar graphic is
//! drawn here.

use crate::core::config::Color;
use crate::core::geo::{Point, Size};
use crate::rendering::filters;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, Blend};
use serde::Serialize;

const NICE_UNITS_M: [u32; 8] = [50, 100, 200, 500, 1000, 2000, 5000, 10000];
const HUD_GREEN: Color = [0, 255, 0, 255];
const HUD_BACKDROP: Color = [0, 40, 0, 150];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleBar {
    pub unit_m: u32,
    pub length_px: u32,
    pub label: String,
}

impl ScaleBar {
    /// Picks the first round distance covering at least 30% of a tile
    pub fn compute(altitude_km: f64, tile_pixels: f64, viewport_width: f64) -> Self {
        let tile_distance_m = (0.98 * altitude_km / 50.0 * 1000.0).max(1.0);
        let unit_m = NICE_UNITS_M
            .iter()
            .copied()
            .find(|unit| *unit as f64 >= tile_distance_m * 0.3)
            .unwrap_or(NICE_UNITS_M[NICE_UNITS_M.len() - 1]);

        let px_per_m = tile_pixels / tile_distance_m;
        let max_len = (viewport_width * 0.4).floor().max(40.0);
        let length_px = (unit_m as f64 * px_per_m).floor().clamp(40.0, max_len) as u32;

        let label = if unit_m < 1000 {
            format!("{} M", unit_m)
        } else {
            format!("{:.1} KM", unit_m as f64 / 1000.0)
        };
        Self {
            unit_m,
            length_px,
            label,
        }
    }
}

/// Text and geometry for the main view's overlay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudReadout {
    pub center_world: Point,
    pub altitude_km: f64,
    pub scale_bar: ScaleBar,
}

impl HudReadout {
    pub fn new(center_world: Point, zoom: f64, tile_pixels: f64, viewport: Size) -> Self {
        let altitude_km = 2.0 / zoom * 400.0;
        Self {
            center_world,
            altitude_km,
            scale_bar: ScaleBar::compute(altitude_km, tile_pixels, viewport.width),
        }
    }

    pub fn altitude_label(&self) -> String {
        format!("ALT {:06.2} KM", self.altitude_km)
    }

    pub fn coordinate_label(&self) -> String {
        format!("X:{:.2} Y:{:.2}", self.center_world.x, self.center_world.y)
    }
}

/// Draws the scale bar box in the bottom-left corner
pub fn draw_scale_bar(image: &mut RgbaImage, bar: &ScaleBar) {
    let (pad_x, pad_y, text_h) = (12_i64, 8_i64, 16_i64);
    let box_w = bar.length_px as i64 + pad_x * 2;
    let box_h = text_h + pad_y * 2 + 6;
    let box_x = 20;
    let box_y = image.height() as i64 - box_h - 20;
    if let Some(backdrop) = filters::clip_rect(image, box_x, box_y, box_w, box_h) {
        // The backdrop is translucent, so blend it over the map.
        let mut canvas = Blend(std::mem::take(image));
        draw_filled_rect_mut(&mut canvas, backdrop, Rgba(HUD_BACKDROP));
        *image = canvas.0;
    }

    let sx = box_x + pad_x;
    let sy = box_y + box_h - pad_y - 6;
    let ex = sx + bar.length_px as i64;
    let strokes = [
        (sx, sy - 2, ex - sx + 1, 4),
        (sx - 1, sy - 8, 3, 17),
        (ex - 1, sy - 8, 3, 17),
    ];
    for (x, y, width, height) in strokes {
        if let Some(rect) = filters::clip_rect(image, x, y, width, height) {
            draw_filled_rect_mut(image, rect, Rgba(HUD_GREEN));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_altitude_label() {
        let hud = HudReadout::new(Point::new(1.0, 2.0), 2.0, 256.0, Size::new(800.0, 600.0));
        assert_eq!(hud.altitude_km, 400.0);
        assert_eq!(hud.altitude_label(), "ALT 400.00 KM");
        let hud = HudReadout::new(Point::new(1.0, 2.0), 5.0, 256.0, Size::new(800.0, 600.0));
        assert_eq!(hud.altitude_label(), "ALT 160.00 KM");
        assert_eq!(hud.coordinate_label(), "X:1.00 Y:2.00");
    }

    #[test]
    fn test_scale_bar_unit_choice() {
        // 400 km altitude: one tile spans 7840 m, 30% is 2352 m.
        let bar = ScaleBar::compute(400.0, 256.0, 800.0);
        assert_eq!(bar.unit_m, 5000);
        assert_eq!(bar.label, "5.0 KM");
        assert_eq!(bar.length_px, 163);

        // Tiny altitude falls to the smallest unit.
        let bar = ScaleBar::compute(1.0, 256.0, 800.0);
        assert_eq!(bar.unit_m, 50);
        assert_eq!(bar.label, "50 M");
        assert_eq!(bar.length_px, 320);
    }

    #[test]
    fn test_scale_bar_draws_inside_small_images() {
        let mut image = RgbaImage::new(50, 30);
        let bar = ScaleBar::compute(400.0, 256.0, 50.0);
        assert_eq!(bar.length_px, 40);
        draw_scale_bar(&mut image, &bar);
    }

    #[test]
    fn test_scale_bar_pixels() {
        let mut image = RgbaImage::from_pixel(200, 100, Rgba([0, 0, 0, 255]));
        let bar = ScaleBar::compute(400.0, 256.0, 200.0);
        draw_scale_bar(&mut image, &bar);
        // Box spans y 42..80; the bar sits on y = 66 from x = 32.
        assert_eq!(bar.length_px, 80);
        assert_eq!(image.get_pixel(72, 66).0, HUD_GREEN);
        assert_eq!(image.get_pixel(32, 58).0, HUD_GREEN);
        assert_eq!(image.get_pixel(112, 74).0, HUD_GREEN);
        let shaded = image.get_pixel(22, 44).0;
        assert_eq!((shaded[0], shaded[2]), (0, 0));
        assert!(shaded[1] > 0 && shaded[1] < 40);
        assert_eq!(image.get_pixel(10, 10).0, [0, 0, 0, 255]);
    }
}
