pub mod events;
pub mod handler;

pub use events::{EventHandled, InputEvent, KeyCode, MouseButton};
pub use handler::{Action, HandlerContext, InputHandler};
