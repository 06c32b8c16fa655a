//! Events module for mode outcomes and engine callbacks
//!
//! `ModeAction` describes what a mode did in response to a key or text
//! event. `EngineEvent` carries the engine's callback hooks
//! (`on_text_response`, `on_audio_transcript`, `on_response_done`,
//! `on_error`) back to the CLI loop.

use serde::{Deserialize, Serialize};

/// Outcome of feeding a key or text event to a mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModeAction {
    /// The event had no meaning for the active mode
    Ignored,

    /// Audio capture began (push-to-talk key down)
    RecordingStarted,

    /// Push-to-talk released after the minimum hold; audio was submitted
    Sent {
        /// How long the key was held
        held_ms: u64,
    },

    /// Push-to-talk released too early; captured audio was discarded
    Cancelled {
        /// How long the key was held
        held_ms: u64,
    },

    /// Always-on listening paused
    Paused,

    /// Always-on listening resumed
    Resumed,

    /// A typed message was forwarded to the engine
    TextSent { text: String },

    /// Turn-based: user started speaking
    TurnStarted,

    /// Turn-based: user finished speaking and yielded the turn
    TurnEnded,

    /// Turn-based: key pressed while the assistant holds the turn
    NotYourTurn,
}

impl ModeAction {
    /// Whether the action changed anything worth reporting
    pub fn is_ignored(&self) -> bool {
        matches!(self, ModeAction::Ignored)
    }
}

impl std::fmt::Display for ModeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModeAction::Ignored => write!(f, "ignored"),
            ModeAction::RecordingStarted => write!(f, "recording..."),
            ModeAction::Sent { held_ms } => write!(f, "sent ({}ms)", held_ms),
            ModeAction::Cancelled { held_ms } => {
                write!(f, "cancelled, held only {}ms", held_ms)
            }
            ModeAction::Paused => write!(f, "paused"),
            ModeAction::Resumed => write!(f, "listening"),
            ModeAction::TextSent { .. } => write!(f, "sent"),
            ModeAction::TurnStarted => write!(f, "your turn: speaking..."),
            ModeAction::TurnEnded => write!(f, "turn ended, waiting for response"),
            ModeAction::NotYourTurn => write!(f, "wait for the response to finish"),
        }
    }
}

/// Callback events emitted by an engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A chunk of streamed assistant text
    TextResponse { text: String },

    /// Transcript of what the user said
    AudioTranscript { text: String },

    /// The assistant finished its response
    ResponseDone,

    /// The engine reported an error
    Error { message: String },
}

impl std::fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineEvent::TextResponse { text } => write!(f, "TEXT_RESPONSE ({} chars)", text.len()),
            EngineEvent::AudioTranscript { text } => {
                write!(f, "AUDIO_TRANSCRIPT ({} chars)", text.len())
            }
            EngineEvent::ResponseDone => write!(f, "RESPONSE_DONE"),
            EngineEvent::Error { message } => write!(f, "ERROR ({})", message),
        }
    }
}
