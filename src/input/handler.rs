use crate::core::geo::{Point, Size};
use crate::input::events::{EventHandled, InputEvent, KeyCode, MouseButton};
use crate::ui::panel::PanelId;

/// What the viewer should do in response to an event
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Move the main view's target offset to an absolute position
    PanTo { target_offset: Point },
    /// Change target zoom by `delta` keeping `anchor` fixed
    Zoom { delta: f64, anchor: Point },
    BeginPanelDrag { panel: PanelId, pointer: Point },
    DragPanel { pointer: Point },
    EndPanelDrag,
    JumpToAnnotation { index: usize },
    CommitAnnotation { text: String },
    ToggleInvert,
    ToggleMinimapInvert,
    ToggleGrid,
    Resize { size: Size },
    Close,
}

/// Viewer state the handler needs to interpret one event
#[derive(Debug, Clone, Copy, Default)]
pub struct HandlerContext {
    pub target_offset: Point,
    /// Topmost panel under the event position
    pub panel: Option<PanelId>,
    /// Log row under the event position
    pub log_entry: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Drag {
    Map { start: Point, start_offset: Point },
    Panel,
}

/// Turns raw input into [`Action`]s.
///
/// Owns the stateful parts of interaction: an in-progress drag and the text
/// of an annotation being typed.
#[derive(Debug, Clone)]
pub struct InputHandler {
    drag: Option<Drag>,
    typing: Option<String>,
    zoom_step: f64,
}

impl InputHandler {
    pub fn new(zoom_step: f64) -> Self {
        Self {
            drag: None,
            typing: None,
            zoom_step,
        }
    }

    /// Text of the annotation being composed, if typing
    pub fn typing(&self) -> Option<&str> {
        self.typing.as_deref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn handle_event(&mut self, event: &InputEvent, context: &HandlerContext) -> (EventHandled, Vec<Action>) {
        let actions = match event {
            InputEvent::PointerDown { position, button } => self.pointer_down(*position, *button, context),
            InputEvent::PointerMove { position } => match self.drag {
                Some(Drag::Map { start, start_offset }) => vec![Action::PanTo {
                    target_offset: start_offset.add(&position.subtract(&start)),
                }],
                Some(Drag::Panel) => vec![Action::DragPanel { pointer: *position }],
                None => Vec::new(),
            },
            InputEvent::PointerUp { .. } => match self.drag.take() {
                Some(Drag::Panel) => vec![Action::EndPanelDrag],
                _ => Vec::new(),
            },
            InputEvent::Scroll { delta, position } => {
                if *delta == 0.0 || !delta.is_finite() {
                    Vec::new()
                } else {
                    vec![Action::Zoom {
                        delta: delta.signum() * self.zoom_step,
                        anchor: *position,
                    }]
                }
            }
            InputEvent::KeyPress { key } => self.key_press(*key),
            InputEvent::Text { text } => match self.typing.as_mut() {
                Some(buffer) => {
                    buffer.extend(text.chars().filter(|c| !c.is_control()));
                    Vec::new()
                }
                None => return (EventHandled::NotHandled, Vec::new()),
            },
            InputEvent::JumpToAnnotation { index } => vec![Action::JumpToAnnotation { index: *index }],
            InputEvent::Resize { size } => vec![Action::Resize { size: *size }],
            InputEvent::CloseRequested => vec![Action::Close],
        };

        let handled = if actions.is_empty() && !self.consumed_silently(event) {
            EventHandled::NotHandled
        } else {
            EventHandled::Handled
        };
        (handled, actions)
    }

    /// Events that only change handler state
    fn consumed_silently(&self, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { .. } | InputEvent::PointerUp { .. } => true,
            InputEvent::PointerMove { .. } => self.drag.is_some(),
            event if event.is_keyboard_event() => self.typing.is_some(),
            _ => false,
        }
    }

    fn pointer_down(&mut self, position: Point, button: MouseButton, context: &HandlerContext) -> Vec<Action> {
        if button != MouseButton::Left {
            return Vec::new();
        }
        if let Some(index) = context.log_entry {
            return vec![Action::JumpToAnnotation { index }];
        }
        if let Some(panel) = context.panel {
            self.drag = Some(Drag::Panel);
            return vec![Action::BeginPanelDrag {
                panel,
                pointer: position,
            }];
        }
        self.drag = Some(Drag::Map {
            start: position,
            start_offset: context.target_offset,
        });
        Vec::new()
    }

    fn key_press(&mut self, key: KeyCode) -> Vec<Action> {
        if let Some(buffer) = self.typing.as_mut() {
            return match key {
                KeyCode::Enter => {
                    let text = std::mem::take(buffer);
                    self.typing = None;
                    vec![Action::CommitAnnotation { text }]
                }
                KeyCode::Backspace => {
                    buffer.pop();
                    Vec::new()
                }
                KeyCode::Escape => {
                    log::debug!("annotation entry cancelled");
                    self.typing = None;
                    Vec::new()
                }
                KeyCode::Char(c) => {
                    if !c.is_control() {
                        buffer.push(c);
                    }
                    Vec::new()
                }
            };
        }

        match key {
            KeyCode::Enter => {
                self.typing = Some(String::new());
                Vec::new()
            }
            KeyCode::Escape => vec![Action::Close],
            KeyCode::Char(c) => match c.to_ascii_lowercase() {
                'i' => vec![Action::ToggleInvert],
                'm' => vec![Action::ToggleMinimapInvert],
                'g' => vec![Action::ToggleGrid],
                _ => Vec::new(),
            },
            KeyCode::Backspace => Vec::new(),
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new(crate::core::constants::ZOOM_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(handler: &mut InputHandler, key: KeyCode) -> Vec<Action> {
        handler
            .handle_event(&InputEvent::KeyPress { key }, &HandlerContext::default())
            .1
    }

    #[test]
    fn test_map_drag_is_relative_to_start_offset() {
        let mut handler = InputHandler::default();
        let context = HandlerContext {
            target_offset: Point::new(-100.0, -50.0),
            ..HandlerContext::default()
        };
        let down = InputEvent::PointerDown {
            position: Point::new(10.0, 10.0),
            button: MouseButton::Left,
        };
        assert_eq!(handler.handle_event(&down, &context).0, EventHandled::Handled);

        let (_, actions) = handler.handle_event(
            &InputEvent::PointerMove {
                position: Point::new(40.0, 0.0),
            },
            &HandlerContext::default(),
        );
        assert_eq!(
            actions,
            vec![Action::PanTo {
                target_offset: Point::new(-70.0, -60.0)
            }]
        );

        handler.handle_event(
            &InputEvent::PointerUp {
                position: Point::new(40.0, 0.0),
            },
            &context,
        );
        assert!(!handler.is_dragging());
        let (handled, actions) = handler.handle_event(
            &InputEvent::PointerMove {
                position: Point::new(90.0, 0.0),
            },
            &context,
        );
        assert_eq!(handled, EventHandled::NotHandled);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_pointer_down_on_panel_and_log_row() {
        let mut handler = InputHandler::default();
        let down = InputEvent::PointerDown {
            position: Point::new(600.0, 30.0),
            button: MouseButton::Left,
        };
        let on_row = HandlerContext {
            panel: Some(PanelId(1)),
            log_entry: Some(3),
            ..HandlerContext::default()
        };
        assert_eq!(handler.handle_event(&down, &on_row).1, vec![Action::JumpToAnnotation { index: 3 }]);
        assert!(!handler.is_dragging());

        let on_panel = HandlerContext {
            panel: Some(PanelId(0)),
            ..HandlerContext::default()
        };
        assert_eq!(
            handler.handle_event(&down, &on_panel).1,
            vec![Action::BeginPanelDrag {
                panel: PanelId(0),
                pointer: Point::new(600.0, 30.0)
            }]
        );
        let up = InputEvent::PointerUp {
            position: Point::new(0.0, 0.0),
        };
        assert_eq!(handler.handle_event(&up, &on_panel).1, vec![Action::EndPanelDrag]);
    }

    #[test]
    fn test_scroll_uses_zoom_step() {
        let mut handler = InputHandler::new(0.5);
        let (_, actions) = handler.handle_event(
            &InputEvent::Scroll {
                delta: -3.0,
                position: Point::new(1.0, 2.0),
            },
            &HandlerContext::default(),
        );
        assert_eq!(
            actions,
            vec![Action::Zoom {
                delta: -0.5,
                anchor: Point::new(1.0, 2.0)
            }]
        );
    }

    #[test]
    fn test_typing_flow() {
        let mut handler = InputHandler::default();
        assert!(press(&mut handler, KeyCode::Enter).is_empty());
        assert_eq!(handler.typing(), Some(""));

        // Toggle keys are text while typing.
        assert!(press(&mut handler, KeyCode::Char('i')).is_empty());
        handler.handle_event(
            &InputEvent::Text {
                text: "ce\u{7}x".to_string(),
            },
            &HandlerContext::default(),
        );
        assert!(press(&mut handler, KeyCode::Backspace).is_empty());
        assert_eq!(handler.typing(), Some("ice"));

        assert_eq!(
            press(&mut handler, KeyCode::Enter),
            vec![Action::CommitAnnotation {
                text: "ice".to_string()
            }]
        );
        assert_eq!(handler.typing(), None);
    }

    #[test]
    fn test_escape_cancels_then_closes() {
        let mut handler = InputHandler::default();
        press(&mut handler, KeyCode::Enter);
        assert!(press(&mut handler, KeyCode::Escape).is_empty());
        assert_eq!(handler.typing(), None);
        assert_eq!(press(&mut handler, KeyCode::Escape), vec![Action::Close]);
    }

    #[test]
    fn test_toggle_keys() {
        let mut handler = InputHandler::default();
        assert_eq!(press(&mut handler, KeyCode::Char('I')), vec![Action::ToggleInvert]);
        assert_eq!(press(&mut handler, KeyCode::Char('m')), vec![Action::ToggleMinimapInvert]);
        assert_eq!(press(&mut handler, KeyCode::Char('g')), vec![Action::ToggleGrid]);
        assert!(press(&mut handler, KeyCode::Char('q')).is_empty());
    }
}
