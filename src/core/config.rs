//! Configuration system for the tile viewer
//!
//! Settings are grouped into sections the same way the engine is split:
//! tile source, zoom limits, animation, scaled-tile cache, rendering, floating
//! panels, annotations and frame timing. Presets resolve into a full
//! [`ViewerConfig`]; custom configurations can be read from JSON.

use crate::core::bounds::Rect;
use crate::core::constants;
use crate::core::viewport::ScaleModel;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// RGBA color as stored in configuration files
pub type Color = [u8; 4];

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerProfile {
    /// Single full-window view
    Viewer,
    /// Main view plus minimap and annotation log
    Dashboard,
    Custom(ViewerConfig),
}

impl ViewerProfile {
    pub fn resolve(&self) -> ViewerConfig {
        match self {
            Self::Viewer => ViewerConfig::default(),
            Self::Dashboard => ViewerConfig {
                panels: PanelConfig {
                    enabled: true,
                    linked_invert: false,
                    ..PanelConfig::default()
                },
                annotations: AnnotationConfig {
                    recenter_uses_stored_zoom: true,
                },
                render: RenderConfig {
                    background: [50, 50, 50, 255],
                    ..RenderConfig::default()
                },
                ..ViewerConfig::default()
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for ViewerProfile {
    fn default() -> Self {
        Self::Viewer
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub tiles: TileSourceConfig,
    pub zoom: ZoomConfig,
    pub animation: AnimationConfig,
    pub cache: CacheConfig,
    pub render: RenderConfig,
    pub panels: PanelConfig,
    pub annotations: AnnotationConfig,
    pub frame: FrameTimingConfig,
}

impl ViewerConfig {
    /// Parses and validates a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ViewerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Points the tile source at a pyramid root
    pub fn with_tile_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.tiles.root = root.into();
        self
    }

    /// Checks cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<()> {
        let zoom = &self.zoom;
        if !(zoom.min_zoom.is_finite() && zoom.min_zoom > 0.0) {
            return Err(Error::Config(format!(
                "min_zoom must be positive, got {}",
                zoom.min_zoom
            )));
        }
        if !(zoom.max_zoom.is_finite() && zoom.max_zoom >= zoom.min_zoom) {
            return Err(Error::Config(format!(
                "max_zoom {} must not be below min_zoom {}",
                zoom.max_zoom, zoom.min_zoom
            )));
        }
        if zoom.start_zoom < zoom.min_zoom || zoom.start_zoom > zoom.max_zoom {
            return Err(Error::Config(format!(
                "start_zoom {} outside [{}, {}]",
                zoom.start_zoom, zoom.min_zoom, zoom.max_zoom
            )));
        }
        if zoom.scale_model == ScaleModel::Linear && zoom.min_zoom.round() < 1.0 {
            return Err(Error::Config(
                "linear scale model needs min_zoom to round to at least level 1".to_string(),
            ));
        }
        if !(zoom.zoom_step > 0.0) {
            return Err(Error::Config("zoom_step must be positive".to_string()));
        }
        let speed = self.animation.smooth_speed;
        if !(speed > 0.0 && speed <= 1.0) {
            return Err(Error::Config(format!(
                "smooth_speed must be in (0, 1], got {}",
                speed
            )));
        }
        if self.tiles.tile_size == 0 {
            return Err(Error::Config("tile_size must be positive".to_string()));
        }
        if self.tiles.extensions.is_empty() {
            return Err(Error::Config(
                "at least one tile extension is required".to_string(),
            ));
        }
        if self.cache.zoom_quantum == 0 || self.cache.capacity == 0 {
            return Err(Error::Config(
                "cache capacity and zoom_quantum must be positive".to_string(),
            ));
        }
        if !(self.panels.minimap_zoom_out >= 0.0) {
            return Err(Error::Config(
                "minimap_zoom_out must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileSourceConfig {
    /// Directory holding `<level>/<column>/<row>.<ext>`
    pub root: PathBuf,
    pub extensions: Vec<String>,
    pub tile_size: u32,
}

impl Default for TileSourceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("tiles"),
            extensions: constants::TILE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            tile_size: constants::TILE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub start_zoom: f64,
    pub zoom_step: f64,
    pub scale_model: ScaleModel,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min_zoom: constants::MIN_ZOOM,
            max_zoom: constants::MAX_ZOOM,
            start_zoom: constants::START_ZOOM,
            zoom_step: constants::ZOOM_STEP,
            scale_model: ScaleModel::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub smooth_speed: f64,
    pub snap_epsilon: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            smooth_speed: constants::SMOOTH_SPEED,
            snap_epsilon: constants::SNAP_EPSILON,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
    pub zoom_quantum: u32,
}

impl CacheConfig {
    /// Rough upper bound on resident pixel memory
    pub fn estimated_memory_usage(&self, tile_size: u32) -> usize {
        let side = tile_size as usize * 2;
        self.capacity * side * side * 4
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: constants::SCALED_CACHE_CAPACITY,
            zoom_quantum: constants::ZOOM_QUANTUM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub background: Color,
    pub missing_tile: Color,
    pub grid_color: Color,
    pub marker_color: Color,
    pub crosshair_color: Color,
    pub show_grid: bool,
    pub invert: bool,
    pub show_crosshair: bool,
    pub show_markers: bool,
    pub crosshair_half_extent: u32,
    pub dash_length: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: [0, 0, 0, 255],
            missing_tile: [70, 70, 70, 255],
            grid_color: [0, 0, 0, 255],
            marker_color: [255, 210, 0, 255],
            crosshair_color: [255, 0, 0, 255],
            show_grid: true,
            invert: false,
            show_crosshair: true,
            show_markers: true,
            crosshair_half_extent: constants::CROSSHAIR_HALF_EXTENT,
            dash_length: constants::GRID_DASH_LENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Whether the minimap and log panels are created at all
    pub enabled: bool,
    /// Minimap invert follows the main view's toggle
    pub linked_invert: bool,
    /// Zoom levels the minimap sits below the main view
    pub minimap_zoom_out: f64,
    pub minimap_rect: Rect,
    pub log_rect: Rect,
    pub log_row_height: f64,
    pub log_visible_rows: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            linked_invert: true,
            minimap_zoom_out: 1.0,
            minimap_rect: Rect::new(560.0, 400.0, 230.0, 170.0),
            log_rect: Rect::new(560.0, 0.0, 240.0, 380.0),
            log_row_height: constants::LOG_ROW_HEIGHT,
            log_visible_rows: constants::LOG_VISIBLE_ROWS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Jumping to an annotation restores the zoom it was recorded at
    pub recenter_uses_stored_zoom: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameTimingConfig {
    pub target_fps: Option<u32>,
}

impl FrameTimingConfig {
    pub fn target_frame_duration(&self) -> Option<std::time::Duration> {
        self.target_fps
            .filter(|fps| *fps > 0)
            .map(|fps| std::time::Duration::from_secs_f64(1.0 / fps as f64))
    }
}

impl Default for FrameTimingConfig {
    fn default() -> Self {
        Self {
            target_fps: Some(constants::TARGET_FPS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_presets() {
        let viewer = ViewerProfile::Viewer.resolve();
        let dashboard = ViewerProfile::Dashboard.resolve();

        assert!(!viewer.panels.enabled);
        assert!(viewer.panels.linked_invert);
        assert!(!viewer.annotations.recenter_uses_stored_zoom);

        assert!(dashboard.panels.enabled);
        assert!(!dashboard.panels.linked_invert);
        assert!(dashboard.annotations.recenter_uses_stored_zoom);
        assert!(dashboard.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ViewerConfig::from_json_str(
            r#"{ "tiles": { "root": "/data/tiles" }, "zoom": { "max_zoom": 7.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.tiles.root, PathBuf::from("/data/tiles"));
        assert_eq!(config.tiles.tile_size, 256);
        assert_eq!(config.zoom.max_zoom, 7.0);
        assert_eq!(config.zoom.min_zoom, 2.0);
        assert_eq!(config.animation.smooth_speed, 0.2);
    }

    #[test]
    fn test_validation_rejects_bad_zoom_limits() {
        let mut config = ViewerConfig::default();
        config.zoom.min_zoom = 0.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = ViewerConfig::default();
        config.zoom.max_zoom = 1.0;
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::default();
        config.animation.smooth_speed = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_json_is_serialization_error() {
        let err = ViewerConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_frame_timing() {
        let config = FrameTimingConfig { target_fps: Some(50) };
        assert_eq!(
            config.target_frame_duration(),
            Some(std::time::Duration::from_millis(20))
        );
        assert_eq!(FrameTimingConfig { target_fps: None }.target_frame_duration(), None);
    }
}
