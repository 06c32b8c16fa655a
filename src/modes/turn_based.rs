//! Turn-based: the user and the assistant alternate

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{Mode, ModeKind};
use crate::engine::{Engine, EngineError};
use crate::events::ModeAction;
use crate::keyboard::{normalize_key, SPACE};

pub struct TurnBasedMode {
    engine: Arc<dyn Engine>,
    is_my_turn: bool,
    is_recording: bool,
    turns: u32,
}

impl TurnBasedMode {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            is_my_turn: true,
            is_recording: false,
            turns: 0,
        }
    }
}

#[async_trait]
impl Mode for TurnBasedMode {
    fn kind(&self) -> ModeKind {
        ModeKind::TurnBased
    }

    fn help(&self) -> &'static str {
        "Press SPACE to start your turn, SPACE again to finish. Q to quit."
    }

    fn bound_keys(&self) -> &'static [&'static str] {
        &[SPACE]
    }

    async fn stop(&mut self) -> Result<(), EngineError> {
        if self.is_recording {
            self.is_recording = false;
            self.engine.clear_audio_buffer().await?;
            self.engine.stop_listening().await?;
        }
        Ok(())
    }

    async fn on_key_down(&mut self, key: &str) -> Result<ModeAction, EngineError> {
        if normalize_key(key) != SPACE {
            return Ok(ModeAction::Ignored);
        }

        if !self.is_my_turn {
            return Ok(ModeAction::NotYourTurn);
        }

        if !self.is_recording {
            self.engine.start_listening().await?;
            self.is_recording = true;
            debug!(turn = self.turns + 1, "turn started");
            return Ok(ModeAction::TurnStarted);
        }

        self.is_recording = false;
        self.engine.stop_listening().await?;
        self.is_my_turn = false;
        self.turns += 1;
        info!(turn = self.turns, "turn handed to assistant");

        Ok(ModeAction::TurnEnded)
    }

    fn on_response_complete(&mut self) {
        if !self.is_my_turn {
            debug!("turn returned to user");
        }
        self.is_my_turn = true;
    }

    fn status(&self) -> String {
        match (self.is_my_turn, self.is_recording) {
            (true, true) => "your turn (speaking)".to_string(),
            (true, false) => "your turn".to_string(),
            (false, _) => "assistant's turn".to_string(),
        }
    }
}
