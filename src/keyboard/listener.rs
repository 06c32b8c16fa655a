//! Terminal key listener using crossterm raw mode
//!
//! Reads key events on a dedicated thread and forwards press/release edges
//! to the CLI loop. Terminals that speak the keyboard enhancement protocol
//! report real releases; for the rest, releases are synthesized from the
//! auto-repeat stream.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyEvent, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::keys::{key_name, KeyEventType};

/// How often the reader thread wakes to check for shutdown and expire keys
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A key edge forwarded from the listener thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub kind: KeyEventType,
    /// Normalized key name
    pub key: String,
}

impl KeyInput {
    pub fn press(key: impl Into<String>) -> Self {
        Self {
            kind: KeyEventType::Press,
            key: key.into(),
        }
    }

    pub fn release(key: impl Into<String>) -> Self {
        Self {
            kind: KeyEventType::Release,
            key: key.into(),
        }
    }
}

/// Errors that can occur in the key listener
#[derive(Debug, thiserror::Error)]
pub enum KeyboardError {
    #[error("key listener is already running")]
    AlreadyRunning,

    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),

    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(String),
}

/// Default quiet period after which a held key counts as released
///
/// Has to outlast the keyboard's initial auto-repeat delay (commonly
/// 250-660 ms), or a held key is released before its first repeat.
pub const DEFAULT_REPEAT_WINDOW: Duration = Duration::from_millis(750);

/// Quiet period that tells a second tap apart from the first auto-repeat
///
/// Once auto-repeat kicks in, repeats follow each other every 30-50 ms.
const TAP_CONFIRM: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy)]
struct HeldKey {
    last: Instant,
    repeating: bool,
    /// A press seen while held that may be either a second tap or the first
    /// auto-repeat
    pending: Option<Instant>,
}

/// Reconstructs key releases from press and auto-repeat events
///
/// A plain terminal only reports presses; holding a key produces a stream
/// of repeats. A key counts as released once no repeat arrived for it
/// within `window`. A press that follows a held key and is not chased by
/// further repeats within [`TAP_CONFIRM`] is a second tap, reported as a
/// release followed by a fresh press.
#[derive(Debug)]
pub struct ReleaseSynthesizer {
    window: Duration,
    held: HashMap<String, HeldKey>,
}

impl ReleaseSynthesizer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            held: HashMap::new(),
        }
    }

    /// Record a press or repeat. Returns `true` for a fresh press.
    pub fn press(&mut self, key: &str, now: Instant) -> bool {
        let Some(state) = self.held.get_mut(key) else {
            self.held.insert(
                key.to_string(),
                HeldKey {
                    last: now,
                    repeating: false,
                    pending: None,
                },
            );
            return true;
        };

        if state.pending.take().is_some() {
            state.repeating = true;
        } else if !state.repeating {
            state.pending = Some(now);
        }
        state.last = now;
        false
    }

    /// Resolve pending taps and release keys whose last repeat is older than
    /// the window
    pub fn expire(&mut self, now: Instant) -> Vec<KeyInput> {
        let window = self.window;
        let mut keys: Vec<String> = self.held.keys().cloned().collect();
        keys.sort();

        let mut inputs = Vec::new();
        for key in keys {
            let Some(state) = self.held.get_mut(&key) else {
                continue;
            };

            if let Some(tapped) = state.pending {
                if now.saturating_duration_since(tapped) >= TAP_CONFIRM {
                    debug!(key = %key, "second tap");
                    *state = HeldKey {
                        last: tapped,
                        repeating: false,
                        pending: None,
                    };
                    inputs.push(KeyInput::release(key.clone()));
                    inputs.push(KeyInput::press(key.clone()));
                }
                continue;
            }

            if now.saturating_duration_since(state.last) >= window {
                self.held.remove(&key);
                inputs.push(KeyInput::release(key));
            }
        }
        inputs
    }

    /// Release everything still held
    pub fn drain(&mut self) -> Vec<String> {
        let mut released: Vec<String> = self.held.drain().map(|(key, _)| key).collect();
        released.sort();
        released
    }
}

/// Turn one crossterm key event into a key edge
///
/// With the enhancement protocol, auto-repeat arrives as `Repeat` and is
/// dropped so toggle keys fire once per physical press.
pub fn translate(
    key: &KeyEvent,
    enhanced: bool,
    synthesizer: &mut ReleaseSynthesizer,
    now: Instant,
) -> Option<KeyInput> {
    let name = key_name(key.code, key.modifiers)?;

    if enhanced {
        return match key.kind {
            KeyEventKind::Press => Some(KeyInput::press(name)),
            KeyEventKind::Repeat => None,
            KeyEventKind::Release => Some(KeyInput::release(name)),
        };
    }

    match key.kind {
        KeyEventKind::Release => None,
        _ if synthesizer.press(&name, now) => Some(KeyInput::press(name)),
        _ => None,
    }
}

/// Raw-mode key listener
pub struct KeyListener {
    event_tx: mpsc::Sender<KeyInput>,
    repeat_window: Duration,
    running: Arc<AtomicBool>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl KeyListener {
    /// Create a new key listener
    pub fn new(event_tx: mpsc::Sender<KeyInput>, repeat_window: Duration) -> Self {
        Self {
            event_tx,
            repeat_window,
            running: Arc::new(AtomicBool::new(false)),
            thread: Mutex::new(None),
        }
    }

    /// Start the listener
    ///
    /// Raw mode is entered on the calling thread so a failure surfaces here
    /// instead of inside the reader. The reader restores the terminal when
    /// it exits.
    pub fn start(&self) -> Result<(), KeyboardError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(KeyboardError::AlreadyRunning);
        }

        if let Err(e) = terminal::enable_raw_mode() {
            self.running.store(false, Ordering::SeqCst);
            return Err(e.into());
        }

        let enhanced = matches!(terminal::supports_keyboard_enhancement(), Ok(true))
            && execute!(
                io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .is_ok();
        info!(enhanced, "key listener starting");

        let event_tx = self.event_tx.clone();
        let running = Arc::clone(&self.running);
        let window = self.repeat_window;

        let handle = thread::Builder::new()
            .name("key-listener".to_string())
            .spawn(move || {
                if let Err(e) = run_reader(&event_tx, &running, enhanced, window) {
                    error!(?e, "key listener error");
                }

                if enhanced {
                    let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
                }
                if let Err(e) = terminal::disable_raw_mode() {
                    warn!(?e, "failed to restore terminal mode");
                }
                running.store(false, Ordering::SeqCst);
                debug!("key listener thread stopped");
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                let _ = terminal::disable_raw_mode();
                KeyboardError::ThreadSpawn(e.to_string())
            })?;

        *self.thread.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        Ok(())
    }

    /// Stop the listener and wait for the terminal to be restored
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let handle = self.thread.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("key listener thread panicked");
                let _ = terminal::disable_raw_mode();
            }
        }
    }
}

impl Drop for KeyListener {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Poll crossterm until stopped or the receiver goes away
fn run_reader(
    event_tx: &mpsc::Sender<KeyInput>,
    running: &AtomicBool,
    enhanced: bool,
    window: Duration,
) -> Result<(), KeyboardError> {
    let mut synthesizer = ReleaseSynthesizer::new(window);
    let send = |input: KeyInput| event_tx.blocking_send(input).is_ok();

    while running.load(Ordering::SeqCst) {
        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if let Some(input) = translate(&key, enhanced, &mut synthesizer, Instant::now()) {
                    if !send(input) {
                        warn!("key receiver closed");
                        return Ok(());
                    }
                }
            }
        }

        for input in synthesizer.expire(Instant::now()) {
            if !send(input) {
                return Ok(());
            }
        }
    }

    for key in synthesizer.drain() {
        let _ = send(KeyInput::release(key));
    }
    Ok(())
}
