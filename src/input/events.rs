use crate::core::geo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Device-independent input events consumed by the viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Button pressed at a window position
    PointerDown {
        position: Point,
        #[serde(default)]
        button: MouseButton,
    },
    PointerMove { position: Point },
    PointerUp { position: Point },
    /// Scroll wheel notches; positive zooms in
    Scroll { delta: f64, position: Point },
    KeyPress { key: KeyCode },
    /// Text typed while composing an annotation
    Text { text: String },
    /// Re-center the main view on a stored annotation
    JumpToAnnotation { index: usize },
    /// Window resize
    Resize { size: Size },
    CloseRequested,
}

/// Keyboard keys the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCode {
    Enter,
    Backspace,
    Escape,
    Char(char),
}

/// Mouse button types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Whether an event was handled
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventHandled {
    Handled,
    NotHandled,
}

impl InputEvent {
    /// Gets the primary position associated with this event, if any
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::PointerDown { position, .. }
            | InputEvent::PointerMove { position }
            | InputEvent::PointerUp { position }
            | InputEvent::Scroll { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// Checks if this is a keyboard event
    pub fn is_keyboard_event(&self) -> bool {
        matches!(self, InputEvent::KeyPress { .. } | InputEvent::Text { .. })
    }
}
