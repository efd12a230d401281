//! Prelude module for common tileview types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use tileview::prelude::*;`

pub use crate::core::{
    bounds::{clamp_offset, Rect, TileBounds},
    config::{
        AnimationConfig, AnnotationConfig, CacheConfig, FrameTimingConfig, PanelConfig, RenderConfig,
        TileSourceConfig, ViewerConfig, ViewerProfile, ZoomConfig,
    },
    geo::{Point, Size, TileIndex},
    viewer::{Frame, Viewer},
    viewport::{ScaleModel, TileRange, ViewTransform, Viewport, ViewportState},
};

pub use crate::animation::{Interpolatable, Smoothing};

pub use crate::input::{
    events::{EventHandled, InputEvent, KeyCode, MouseButton},
    handler::{Action, InputHandler},
};

pub use crate::layers::marker::{AnnotationStore, Marker};

pub use crate::rendering::{render_map, Crosshair, HudReadout, RenderOptions, RenderedFrame};

pub use crate::runtime::{FrameClock, FrameLoop, FrameSink, InputSource};

pub use crate::tiles::{LevelSwap, PyramidSnapshot, ScaledTileCache, ScaledTileKey, Tile, TilePyramid, TileStore};

pub use crate::ui::{FloatingPanel, LogLayout, PanelId, PanelKind, PanelStack};

pub use crate::{Error as ViewerError, Result};

pub use std::{sync::Arc, time::Duration};

pub use fxhash::FxHashMap as HashMap;
