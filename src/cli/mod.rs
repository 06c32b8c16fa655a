//! Interactive session driver
//!
//! Owns the engine and the active mode, relays key or line input to the
//! mode and engine callbacks to the terminal.

mod display;
mod input;

use std::future::Future;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::engine::{Engine, EngineError};
use crate::events::{EngineEvent, ModeAction};
use crate::keyboard::{KeyEventType, KeyInput, KeyListener, SimpleKeyboard, SPACE};
use crate::lifecycle::ShutdownSignal;
use crate::modes::{InputStyle, Mode};

pub use display::Printer;
use input::spawn_line_reader;

/// Keys that end the session in key-driven modes
const QUIT_KEYS: [&str; 3] = ["q", "esc", "ctrl+c"];
const HELP_KEY: &str = "h";

/// Pending stdin lines buffered between the reader thread and the loop
const LINE_CAPACITY: usize = 16;

/// Intents produced by key callbacks
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    KeyDown(String),
    KeyUp(String),
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Bind mode keys plus the session keys to callbacks that forward commands
fn bind_keys(mode_keys: &[&str], tx: mpsc::UnboundedSender<Command>) -> SimpleKeyboard {
    let mut keyboard = SimpleKeyboard::new();

    for &key in mode_keys {
        let (down_tx, up_tx) = (tx.clone(), tx.clone());
        let (down_key, up_key) = (key.to_string(), key.to_string());
        let on_down = move || {
            let _ = down_tx.send(Command::KeyDown(down_key.clone()));
        };
        let on_up = move || {
            let _ = up_tx.send(Command::KeyUp(up_key.clone()));
        };

        if key == SPACE {
            keyboard.on_space(on_down, on_up);
        } else {
            keyboard.on_key(key, on_down);
            keyboard.handler_mut().on_release(key, on_up);
        }
    }

    for key in QUIT_KEYS {
        let quit_tx = tx.clone();
        keyboard.on_key(key, move || {
            let _ = quit_tx.send(Command::Quit);
        });
    }

    keyboard.on_key(HELP_KEY, move || {
        let _ = tx.send(Command::Help);
    });

    debug!(
        press = ?keyboard.handler().callbacks(KeyEventType::Press),
        release = ?keyboard.handler().callbacks(KeyEventType::Release),
        "key bindings"
    );
    keyboard
}

/// Terminal session over one engine and one mode
pub struct VoxTermCli {
    engine: Arc<dyn Engine>,
    events: mpsc::Receiver<EngineEvent>,
    mode: Box<dyn Mode>,
    repeat_window: Duration,
}

impl VoxTermCli {
    pub fn new(
        engine: Arc<dyn Engine>,
        events: mpsc::Receiver<EngineEvent>,
        mode: Box<dyn Mode>,
        repeat_window: Duration,
    ) -> Self {
        Self {
            engine,
            events,
            mode,
            repeat_window,
        }
    }

    /// Connect, run the input loop until quit, then tear down
    pub async fn run(mut self) -> Result<()> {
        let style = self.mode.input_style();
        let mut printer = Printer::stdout(style == InputStyle::Keys);

        printer.line("Connecting...");
        self.engine
            .connect()
            .await
            .context("failed to connect engine")?;
        info!(mode = %self.mode.kind(), "session started");

        printer.banner(self.mode.as_ref());

        let result = match self.mode.start().await {
            Ok(()) => match style {
                InputStyle::Keys => self.run_keys(&mut printer).await,
                InputStyle::Lines => self.run_stdin(&mut printer).await,
            },
            Err(e) => Err(anyhow::Error::new(e).context("failed to start mode")),
        };

        self.teardown().await;

        printer.line("Goodbye.");
        info!("session ended");
        result
    }

    /// Stop the mode, then disconnect unless the engine already dropped
    async fn teardown(&mut self) {
        if let Err(e) = self.mode.stop().await {
            warn!(?e, "failed to stop mode cleanly");
        }

        if !self.engine.is_connected() {
            warn!("engine dropped its connection during the session");
            return;
        }
        if let Err(e) = self.engine.disconnect().await {
            warn!(?e, "failed to disconnect engine");
        }
    }

    async fn run_keys<W: Write>(&mut self, printer: &mut Printer<W>) -> Result<()> {
        let (key_tx, mut key_rx) = mpsc::channel::<KeyInput>(64);
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
        let mut keyboard = bind_keys(self.mode.bound_keys(), cmd_tx);

        let listener = KeyListener::new(key_tx, self.repeat_window);
        listener.start().context("failed to start key listener")?;

        let shutdown = ShutdownSignal::new();
        let shutdown = shutdown.wait();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                Some(input) = key_rx.recv() => {
                    keyboard.handler_mut().dispatch(&input);
                }
                Some(command) = cmd_rx.recv() => {
                    if self.handle_command(command, printer).await == Flow::Quit {
                        break;
                    }
                }
                event = self.events.recv() => {
                    let Some(event) = event else {
                        printer.error("engine closed its event stream");
                        break;
                    };
                    self.handle_engine_event(event, printer);
                }
                result = &mut shutdown => {
                    if let Err(e) = result {
                        warn!(?e, "shutdown signal handler failed");
                    }
                    break;
                }
            }
        }

        listener.stop();
        Ok(())
    }

    async fn run_stdin<W: Write>(&mut self, printer: &mut Printer<W>) -> Result<()> {
        let (line_tx, line_rx) = mpsc::channel(LINE_CAPACITY);
        spawn_line_reader(io::BufReader::new(io::stdin()), line_tx)
            .context("failed to start line reader")?;

        let shutdown = ShutdownSignal::new();
        self.run_lines(printer, line_rx, shutdown.wait()).await
    }

    /// Line loop; returns without waiting on the reader
    async fn run_lines<W, S>(
        &mut self,
        printer: &mut Printer<W>,
        mut lines: mpsc::Receiver<io::Result<String>>,
        shutdown: S,
    ) -> Result<()>
    where
        W: Write,
        S: Future<Output = io::Result<()>>,
    {
        tokio::pin!(shutdown);

        printer.prompt();

        loop {
            tokio::select! {
                line = lines.recv() => {
                    let Some(line) = line.transpose().context("failed to read input")? else {
                        break;
                    };
                    if self.handle_line(&line, printer).await == Flow::Quit {
                        break;
                    }
                }
                event = self.events.recv() => {
                    let Some(event) = event else {
                        printer.error("engine closed its event stream");
                        break;
                    };
                    let done = event == EngineEvent::ResponseDone;
                    self.handle_engine_event(event, printer);
                    if done {
                        printer.prompt();
                    }
                }
                result = &mut shutdown => {
                    if let Err(e) = result {
                        warn!(?e, "shutdown signal handler failed");
                    }
                    break;
                }
            }
        }

        Ok(())
    }

    async fn handle_command<W: Write>(&mut self, command: Command, printer: &mut Printer<W>) -> Flow {
        let result = match command {
            Command::KeyDown(key) => self.mode.on_key_down(&key).await,
            Command::KeyUp(key) => self.mode.on_key_up(&key).await,
            Command::Help => {
                printer.help(self.mode.as_ref());
                return Flow::Continue;
            }
            Command::Quit => return Flow::Quit,
        };

        report(result, printer);
        Flow::Continue
    }

    async fn handle_line<W: Write>(&mut self, line: &str, printer: &mut Printer<W>) -> Flow {
        match line.trim() {
            "/quit" | "/exit" => return Flow::Quit,
            "/help" => {
                printer.help(self.mode.as_ref());
                printer.prompt();
                return Flow::Continue;
            }
            _ => {}
        }

        match self.mode.on_text_input(line).await {
            Ok(Some(_)) => {}
            Ok(None) => printer.prompt(),
            Err(e) => {
                report(Err(e), printer);
                printer.prompt();
            }
        }
        Flow::Continue
    }

    fn handle_engine_event<W: Write>(&mut self, event: EngineEvent, printer: &mut Printer<W>) {
        match event {
            EngineEvent::TextResponse { text } => printer.assistant_chunk(&text),
            EngineEvent::AudioTranscript { text } => printer.transcript(&text),
            EngineEvent::ResponseDone => {
                self.mode.on_response_complete();
                printer.response_done(&self.mode.status());
            }
            EngineEvent::Error { message } => {
                error!(%message, "engine error");
                printer.error(&message);
            }
        }
    }
}

/// Print the outcome of one interaction; failures abort only that interaction
fn report<W: Write>(result: Result<ModeAction, EngineError>, printer: &mut Printer<W>) {
    match result {
        Ok(action) => printer.action(&action),
        Err(e) => {
            error!(?e, "interaction failed");
            printer.error(&e.to_string());
        }
    }
}
