//! Push-to-talk: hold SPACE to record, release to send

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info};

use super::{Mode, ModeKind};
use crate::engine::{Engine, EngineError};
use crate::events::ModeAction;
use crate::keyboard::{normalize_key, SPACE};

pub struct PushToTalkMode {
    engine: Arc<dyn Engine>,
    min_hold: Duration,
    is_recording: bool,
    pressed_at: Option<Instant>,
}

impl PushToTalkMode {
    pub fn new(engine: Arc<dyn Engine>, min_hold: Duration) -> Self {
        Self {
            engine,
            min_hold,
            is_recording: false,
            pressed_at: None,
        }
    }
}

#[async_trait]
impl Mode for PushToTalkMode {
    fn kind(&self) -> ModeKind {
        ModeKind::PushToTalk
    }

    fn help(&self) -> &'static str {
        "Hold SPACE to talk, release to send. Q to quit."
    }

    fn bound_keys(&self) -> &'static [&'static str] {
        &[SPACE]
    }

    async fn stop(&mut self) -> Result<(), EngineError> {
        if self.is_recording {
            self.is_recording = false;
            self.pressed_at = None;
            self.engine.clear_audio_buffer().await?;
            self.engine.stop_listening().await?;
        }
        Ok(())
    }

    async fn on_key_down(&mut self, key: &str) -> Result<ModeAction, EngineError> {
        // Auto-repeat delivers extra downs while the key is held
        if normalize_key(key) != SPACE || self.is_recording {
            return Ok(ModeAction::Ignored);
        }

        self.engine.start_listening().await?;
        self.is_recording = true;
        self.pressed_at = Some(Instant::now());
        debug!("push-to-talk recording");

        Ok(ModeAction::RecordingStarted)
    }

    async fn on_key_up(&mut self, key: &str) -> Result<ModeAction, EngineError> {
        if normalize_key(key) != SPACE || !self.is_recording {
            return Ok(ModeAction::Ignored);
        }

        self.is_recording = false;
        let held = self
            .pressed_at
            .take()
            .map(|t| t.elapsed())
            .unwrap_or_default();
        let held_ms = held.as_millis() as u64;

        if held < self.min_hold {
            info!(held_ms, min_hold_ms = self.min_hold.as_millis() as u64, "press too short, cancelling");
            self.engine.clear_audio_buffer().await?;
            self.engine.stop_listening().await?;
            return Ok(ModeAction::Cancelled { held_ms });
        }

        self.engine.stop_listening().await?;
        info!(held_ms, "push-to-talk sent");
        Ok(ModeAction::Sent { held_ms })
    }

    fn status(&self) -> String {
        if self.is_recording {
            "recording".to_string()
        } else {
            "idle".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::{Call, MockEngine};

    fn create_mode() -> (PushToTalkMode, Arc<MockEngine>) {
        let engine = Arc::new(MockEngine::new());
        let mode = PushToTalkMode::new(engine.clone(), Duration::from_millis(200));
        (mode, engine)
    }

    #[test]
    fn test_help_mentions_space() {
        let (mode, _) = create_mode();
        assert!(mode.help().contains("SPACE"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_held_press_sends() {
        let (mut mode, engine) = create_mode();

        let action = mode.on_key_down("space").await.unwrap();
        assert_eq!(action, ModeAction::RecordingStarted);
        assert!(mode.is_recording);

        tokio::time::sleep(Duration::from_millis(300)).await;

        let action = mode.on_key_up("space").await.unwrap();
        assert!(matches!(action, ModeAction::Sent { held_ms } if held_ms >= 300));
        assert!(!mode.is_recording);
        assert_eq!(engine.calls(), vec![Call::StartListening, Call::StopListening]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_press_cancels() {
        let (mut mode, engine) = create_mode();

        mode.on_key_down("space").await.unwrap();
        let action = mode.on_key_up("space").await.unwrap();

        assert!(matches!(action, ModeAction::Cancelled { .. }));
        assert!(!mode.is_recording);
        assert_eq!(
            engine.calls(),
            vec![Call::StartListening, Call::ClearAudioBuffer, Call::StopListening]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_is_inclusive() {
        let (mut mode, _) = create_mode();

        mode.on_key_down("space").await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        let action = mode.on_key_up("space").await.unwrap();
        assert!(matches!(action, ModeAction::Sent { .. }));
    }

    #[tokio::test]
    async fn test_repeat_downs_ignored() {
        let (mut mode, engine) = create_mode();

        mode.on_key_down("space").await.unwrap();
        let action = mode.on_key_down("space").await.unwrap();
        assert!(action.is_ignored());
        assert_eq!(engine.calls(), vec![Call::StartListening]);
    }

    #[tokio::test]
    async fn test_other_keys_ignored() {
        let (mut mode, engine) = create_mode();

        assert!(mode.on_key_down("a").await.unwrap().is_ignored());
        assert!(mode.on_key_up("space").await.unwrap().is_ignored());
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stop_discards_recording() {
        let (mut mode, engine) = create_mode();

        mode.on_key_down(" ").await.unwrap();
        mode.stop().await.unwrap();

        assert!(!mode.is_recording);
        assert_eq!(
            engine.calls(),
            vec![Call::StartListening, Call::ClearAudioBuffer, Call::StopListening]
        );
    }
}
