//! # tileview
//!
//! A tiled-map viewport engine: loads one level of an on-disk tile pyramid at
//! a time, animates pan and zoom with exponential smoothing, memoizes
//! resampled tiles and composes each frame into a raster image together with
//! annotations, a minimap and an annotation log.
//!
//! The engine is single threaded. A [`Viewer`] owns all mutable state and is
//! driven once per frame (`handle_event` → `tick` → `render`), either by the
//! embedding application or by [`runtime::FrameLoop`].

pub mod animation;
pub mod core;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod rendering;
pub mod runtime;
pub mod tiles;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    bounds::{clamp_offset, Rect, TileBounds},
    config::{ViewerConfig, ViewerProfile},
    geo::{Point, Size, TileIndex},
    viewer::{Frame, Viewer},
    viewport::{ScaleModel, ViewTransform, Viewport, ViewportState},
};

pub use layers::marker::{AnnotationStore, Marker};

pub use input::{events::InputEvent, handler::InputHandler};

pub use rendering::compositor::{render_map, RenderOptions, RenderedFrame};

pub use tiles::{LevelSwap, PyramidSnapshot, ScaledTileCache, TilePyramid, TileStore};

pub use ui::{FloatingPanel, PanelStack};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
}

/// Error type alias for convenience
pub type Error = ViewerError;

/// Installs `env_logger` as the `log` backend. Safe to call more than once.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
}

/// Logging is compiled out without the `debug` feature.
#[cfg(not(feature = "debug"))]
pub fn init_logging() {}
