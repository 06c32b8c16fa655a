//! Text: typed lines are sent as messages

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{InputStyle, Mode, ModeKind};
use crate::engine::{Engine, EngineError};

pub struct TextMode {
    engine: Arc<dyn Engine>,
    messages_sent: usize,
}

impl TextMode {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            messages_sent: 0,
        }
    }
}

#[async_trait]
impl Mode for TextMode {
    fn kind(&self) -> ModeKind {
        ModeKind::Text
    }

    fn help(&self) -> &'static str {
        "Type a message and press Enter. /help for help, /quit to exit."
    }

    fn input_style(&self) -> InputStyle {
        InputStyle::Lines
    }

    async fn on_text_input(&mut self, text: &str) -> Result<Option<String>, EngineError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        self.engine.send_text(text).await?;
        self.messages_sent += 1;
        debug!(count = self.messages_sent, "text message sent");

        Ok(Some(text.to_string()))
    }

    fn status(&self) -> String {
        format!("{} sent", self.messages_sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::{Call, MockEngine};

    #[tokio::test]
    async fn test_text_is_sent() {
        let engine = Arc::new(MockEngine::new());
        let mut mode = TextMode::new(engine.clone());

        let sent = mode.on_text_input("Hello, this is a test").await.unwrap();
        assert_eq!(sent.as_deref(), Some("Hello, this is a test"));
        assert_eq!(engine.calls(), vec![Call::SendText("Hello, this is a test".into())]);
        assert_eq!(mode.messages_sent, 1);
    }

    #[tokio::test]
    async fn test_input_is_trimmed() {
        let engine = Arc::new(MockEngine::new());
        let mut mode = TextMode::new(engine.clone());

        let sent = mode.on_text_input("  hi there \n").await.unwrap();
        assert_eq!(sent.as_deref(), Some("hi there"));
    }

    #[tokio::test]
    async fn test_blank_input_not_sent() {
        let engine = Arc::new(MockEngine::new());
        let mut mode = TextMode::new(engine.clone());

        assert_eq!(mode.on_text_input("").await.unwrap(), None);
        assert_eq!(mode.on_text_input("   ").await.unwrap(), None);
        assert!(engine.calls().is_empty());
        assert_eq!(mode.messages_sent, 0);
    }

    #[tokio::test]
    async fn test_send_failure_propagates() {
        let engine = Arc::new(MockEngine::failing());
        let mut mode = TextMode::new(engine);

        tokio_test::assert_err!(mode.on_text_input("hello").await);
        assert_eq!(mode.messages_sent, 0);
    }
}
