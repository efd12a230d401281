pub mod compositor;
pub mod filters;
pub mod hud;

// Re-export main types
pub use compositor::{render_map, Crosshair, RenderOptions, RenderedFrame};
pub use hud::{HudReadout, ScaleBar};
