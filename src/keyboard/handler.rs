//! Key name to callback dispatch

use std::collections::HashMap;

use tracing::trace;

use super::keys::{normalize_key, KeyEventType, SPACE};
use super::listener::KeyInput;

/// Callback invoked on a key edge
pub type KeyCallback = Box<dyn FnMut() + Send>;

/// Maps (event type, normalized key name) to a callback
pub struct KeyboardHandler {
    callbacks: HashMap<KeyEventType, HashMap<String, KeyCallback>>,
}

impl KeyboardHandler {
    pub fn new() -> Self {
        let mut callbacks = HashMap::new();
        callbacks.insert(KeyEventType::Press, HashMap::new());
        callbacks.insert(KeyEventType::Release, HashMap::new());
        Self { callbacks }
    }

    /// Register a press callback, replacing any previous one for the key
    pub fn on_press(&mut self, key: &str, callback: impl FnMut() + Send + 'static) {
        self.register(KeyEventType::Press, key, Box::new(callback));
    }

    /// Register a release callback, replacing any previous one for the key
    pub fn on_release(&mut self, key: &str, callback: impl FnMut() + Send + 'static) {
        self.register(KeyEventType::Release, key, Box::new(callback));
    }

    fn register(&mut self, kind: KeyEventType, key: &str, callback: KeyCallback) {
        self.callbacks
            .entry(kind)
            .or_default()
            .insert(normalize_key(key), callback);
    }

    /// Run the callback bound to `key` for this edge, if any
    ///
    /// Returns whether a callback ran.
    pub fn handle_key_event(&mut self, kind: KeyEventType, key: &str) -> bool {
        let key = normalize_key(key);
        match self.callback_mut(kind, &key) {
            Some(callback) => {
                trace!(%kind, %key, "key callback");
                callback();
                true
            }
            None => false,
        }
    }

    /// Dispatch an event from the key listener
    pub fn dispatch(&mut self, input: &KeyInput) -> bool {
        self.handle_key_event(input.kind, &input.key)
    }

    /// Direct access to a registered callback
    pub fn callback_mut(&mut self, kind: KeyEventType, key: &str) -> Option<&mut KeyCallback> {
        self.callbacks.get_mut(&kind)?.get_mut(&normalize_key(key))
    }

    /// Sorted names of keys with a callback for this edge
    pub fn callbacks(&self, kind: KeyEventType) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .callbacks
            .get(&kind)
            .map(|keys| keys.keys().map(String::as_str).collect())
            .unwrap_or_default();
        keys.sort_unstable();
        keys
    }
}

impl Default for KeyboardHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience wrapper for the common bindings
pub struct SimpleKeyboard {
    handler: KeyboardHandler,
}

impl SimpleKeyboard {
    pub fn new() -> Self {
        Self {
            handler: KeyboardHandler::new(),
        }
    }

    /// Bind both edges of the space bar
    pub fn on_space(
        &mut self,
        on_press: impl FnMut() + Send + 'static,
        on_release: impl FnMut() + Send + 'static,
    ) {
        self.handler.on_press(SPACE, on_press);
        self.handler.on_release(SPACE, on_release);
    }

    /// Bind a key press
    pub fn on_key(&mut self, key: &str, on_press: impl FnMut() + Send + 'static) {
        self.handler.on_press(key, on_press);
    }

    pub fn handler(&self) -> &KeyboardHandler {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut KeyboardHandler {
        &mut self.handler
    }
}

impl Default for SimpleKeyboard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_press_and_release_callbacks() {
        let mut handler = KeyboardHandler::new();
        let (presses, on_press) = counter();
        let (releases, on_release) = counter();

        handler.on_press("a", on_press);
        handler.on_release("a", on_release);

        assert!(handler.handle_key_event(KeyEventType::Press, "a"));
        assert!(handler.handle_key_event(KeyEventType::Release, "a"));

        assert_eq!(presses.load(Ordering::SeqCst), 1);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_registration_is_normalized() {
        let mut handler = KeyboardHandler::new();
        let (presses, on_press) = counter();

        handler.on_press(" ", on_press);
        assert!(handler.handle_key_event(KeyEventType::Press, "space"));
        assert!(handler.handle_key_event(KeyEventType::Press, "Key.space"));
        assert_eq!(presses.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unbound_key_is_ignored() {
        let mut handler = KeyboardHandler::new();
        let (presses, on_press) = counter();
        handler.on_press("a", on_press);

        assert!(!handler.handle_key_event(KeyEventType::Press, "b"));
        assert!(!handler.handle_key_event(KeyEventType::Release, "a"));
        assert_eq!(presses.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reregistering_replaces() {
        let mut handler = KeyboardHandler::new();
        let (first, on_first) = counter();
        let (second, on_second) = counter();

        handler.on_press("x", on_first);
        handler.on_press("X", on_second);
        handler.handle_key_event(KeyEventType::Press, "x");

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_listener_input() {
        let mut handler = KeyboardHandler::new();
        let (releases, on_release) = counter();
        handler.on_release("space", on_release);

        let input = KeyInput::release("space");
        assert!(handler.dispatch(&input));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_simple_keyboard_registration() {
        let mut kb = SimpleKeyboard::new();
        let (space_down, on_down) = counter();
        let (space_up, on_up) = counter();
        let (m_down, on_m) = counter();

        kb.on_space(on_down, on_up);
        kb.on_key("m", on_m);

        assert_eq!(kb.handler().callbacks(KeyEventType::Press), vec!["m", "space"]);
        assert_eq!(kb.handler().callbacks(KeyEventType::Release), vec!["space"]);

        let handler = kb.handler_mut();
        (handler.callback_mut(KeyEventType::Press, "space").unwrap())();
        (handler.callback_mut(KeyEventType::Release, "space").unwrap())();
        (handler.callback_mut(KeyEventType::Press, "m").unwrap())();

        assert_eq!(space_down.load(Ordering::SeqCst), 1);
        assert_eq!(space_up.load(Ordering::SeqCst), 1);
        assert_eq!(m_down.load(Ordering::SeqCst), 1);
    }
}
