pub mod panel;
pub mod panels;

pub use panel::{minimap_transform, FloatingPanel, PanelId, PanelKind};
pub use panels::{render_log_panel, LogLayout, LogLine, PanelStack};
