//! Always-on: the engine listens continuously, P pauses and resumes

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{Mode, ModeKind};
use crate::engine::{Engine, EngineError};
use crate::events::ModeAction;
use crate::keyboard::normalize_key;

const PAUSE_KEY: &str = "p";

pub struct AlwaysOnMode {
    engine: Arc<dyn Engine>,
    is_active: bool,
    is_paused: bool,
}

impl AlwaysOnMode {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            is_active: false,
            is_paused: false,
        }
    }
}

#[async_trait]
impl Mode for AlwaysOnMode {
    fn kind(&self) -> ModeKind {
        ModeKind::AlwaysOn
    }

    fn help(&self) -> &'static str {
        "Listening continuously. P to pause/resume, Q to quit."
    }

    fn bound_keys(&self) -> &'static [&'static str] {
        &[PAUSE_KEY]
    }

    async fn start(&mut self) -> Result<(), EngineError> {
        if !self.is_active {
            self.engine.start_listening().await?;
            self.is_active = true;
            self.is_paused = false;
            info!("always-on listening started");
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), EngineError> {
        let was_listening = self.is_active && !self.is_paused;
        self.is_active = false;
        self.is_paused = false;

        if was_listening {
            self.engine.stop_listening().await?;
        }
        Ok(())
    }

    async fn on_key_down(&mut self, key: &str) -> Result<ModeAction, EngineError> {
        if normalize_key(key) != PAUSE_KEY || !self.is_active {
            return Ok(ModeAction::Ignored);
        }

        if self.is_paused {
            self.engine.start_listening().await?;
            self.is_paused = false;
            info!("always-on resumed");
            Ok(ModeAction::Resumed)
        } else {
            // Drop half-spoken audio instead of committing it
            self.engine.clear_audio_buffer().await?;
            self.engine.stop_listening().await?;
            self.is_paused = true;
            info!("always-on paused");
            Ok(ModeAction::Paused)
        }
    }

    fn status(&self) -> String {
        match (self.is_active, self.is_paused) {
            (false, _) => "stopped".to_string(),
            (true, true) => "paused".to_string(),
            (true, false) => "listening".to_string(),
        }
    }
}
