//! Keyboard module for terminal key handling
//!
//! Reads key press/release edges from the terminal and dispatches them to
//! callbacks registered by normalized key name.

mod handler;
mod keys;
mod listener;

pub use handler::SimpleKeyboard;
pub use keys::{normalize_key, KeyEventType, SPACE};
pub use listener::{KeyInput, KeyListener, DEFAULT_REPEAT_WINDOW};
