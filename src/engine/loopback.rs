//! Offline engine that echoes input back through the event channel
//!
//! Lets the CLI run end-to-end without a backend. There is no audio I/O:
//! a listening span is tracked only by its start time, and stopping emits a
//! transcript describing how long the span was.
//!
//! Replies are streamed by one worker task per connection, so a reply never
//! interleaves with the previous one.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};

use super::{Engine, EngineConfig, EngineError};
use crate::events::EngineEvent;

/// Delay between streamed reply chunks
const CHUNK_DELAY: Duration = Duration::from_millis(15);

/// Events to emit ahead of a streamed reply, and the reply itself
#[derive(Debug)]
struct Reply {
    events: Vec<EngineEvent>,
    text: String,
}

#[derive(Debug, Default)]
struct LoopbackState {
    connected: bool,
    listening: bool,
    /// Start of the audio that would be committed on stop; `None` once cleared
    buffer_started: Option<Instant>,
    /// Queue of the reply worker, present while connected
    replies: Option<mpsc::UnboundedSender<Reply>>,
}

/// Built-in engine used when no external engine is wired in
pub struct LoopbackEngine {
    config: EngineConfig,
    event_tx: mpsc::Sender<EngineEvent>,
    state: Mutex<LoopbackState>,
}

impl LoopbackEngine {
    pub fn new(config: EngineConfig, event_tx: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            config,
            event_tx,
            state: Mutex::new(LoopbackState::default()),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut LoopbackState) -> T) -> T {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    fn ensure_connected(&self) -> Result<(), EngineError> {
        if self.with_state(|s| s.connected) {
            Ok(())
        } else {
            Err(EngineError::NotConnected)
        }
    }

    /// Queue a reply behind any that are still streaming
    fn respond(&self, events: Vec<EngineEvent>, text: String) -> Result<(), EngineError> {
        let queued = self.with_state(|s| {
            s.replies
                .as_ref()
                .is_some_and(|tx| tx.send(Reply { events, text }).is_ok())
        });
        if queued {
            Ok(())
        } else {
            Err(EngineError::Closed)
        }
    }
}

/// Stream queued replies word by word, each followed by `ResponseDone`
async fn stream_replies(tx: mpsc::Sender<EngineEvent>, mut replies: mpsc::UnboundedReceiver<Reply>) {
    while let Some(reply) = replies.recv().await {
        for event in reply.events {
            if tx.send(event).await.is_err() {
                return;
            }
        }
        for chunk in reply.text.split_inclusive(' ') {
            tokio::time::sleep(CHUNK_DELAY).await;
            let event = EngineEvent::TextResponse {
                text: chunk.to_string(),
            };
            if tx.send(event).await.is_err() {
                return;
            }
        }
        if tx.send(EngineEvent::ResponseDone).await.is_err() {
            return;
        }
    }
    debug!("loopback reply worker stopped");
}

#[async_trait]
impl Engine for LoopbackEngine {
    async fn connect(&self) -> Result<(), EngineError> {
        let replies = self.with_state(|s| {
            if s.connected {
                return None;
            }
            let (tx, rx) = mpsc::unbounded_channel();
            s.connected = true;
            s.replies = Some(tx);
            Some(rx)
        });
        let Some(replies) = replies else {
            return Err(EngineError::AlreadyConnected);
        };
        tokio::spawn(stream_replies(self.event_tx.clone(), replies));

        info!(
            voice = %self.config.voice,
            latency = %self.config.latency_mode,
            vad = self.config.vad_enabled,
            has_api_key = self.config.api_key.is_some(),
            "loopback engine connected"
        );
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), EngineError> {
        self.with_state(|s| *s = LoopbackState::default());
        debug!("loopback engine disconnected");
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<(), EngineError> {
        self.ensure_connected()?;
        if self.event_tx.is_closed() {
            return Err(EngineError::Closed);
        }

        debug!(chars = text.len(), "loopback text received");
        self.respond(Vec::new(), format!("You said: {}", text))
    }

    async fn start_listening(&self) -> Result<(), EngineError> {
        self.ensure_connected()?;
        self.with_state(|s| {
            s.listening = true;
            s.buffer_started = Some(Instant::now());
        });
        debug!("loopback listening");
        Ok(())
    }

    async fn stop_listening(&self) -> Result<(), EngineError> {
        self.ensure_connected()?;
        let span = self.with_state(|s| {
            if !s.listening {
                return Err(EngineError::NotListening);
            }
            s.listening = false;
            Ok(s.buffer_started.take().map(|t| t.elapsed()))
        })?;

        if let Some(span) = span {
            if self.event_tx.is_closed() {
                return Err(EngineError::Closed);
            }
            let transcript = format!("[{}ms of audio]", span.as_millis());
            debug!(%transcript, "loopback committed audio");
            self.respond(
                vec![EngineEvent::AudioTranscript {
                    text: transcript.clone(),
                }],
                format!("I heard {}", transcript),
            )?;
        }
        Ok(())
    }

    async fn clear_audio_buffer(&self) -> Result<(), EngineError> {
        self.ensure_connected()?;
        self.with_state(|s| s.buffer_started = None);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.with_state(|s| s.connected)
    }
}
