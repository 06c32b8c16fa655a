//! Interaction modes
//!
//! Each mode is a small state machine that turns key or text events into
//! engine calls:
//! - PushToTalk: hold SPACE to record, release to send
//! - AlwaysOn: engine listens continuously, P pauses and resumes
//! - Text: typed lines are sent as messages
//! - TurnBased: SPACE starts and ends the user's turn, then the assistant answers

mod always_on;
mod push_to_talk;
mod text;
mod turn_based;

pub use always_on::AlwaysOnMode;
pub use push_to_talk::PushToTalkMode;
pub use text::TextMode;
pub use turn_based::TurnBasedMode;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::engine::{Engine, EngineError};
use crate::events::ModeAction;

/// The four interaction modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    PushToTalk,
    AlwaysOn,
    Text,
    TurnBased,
}

impl Default for ModeKind {
    fn default() -> Self {
        Self::PushToTalk
    }
}

impl ModeKind {
    /// Menu order; position + 1 is the selector number
    pub const ALL: [ModeKind; 4] = [
        ModeKind::PushToTalk,
        ModeKind::AlwaysOn,
        ModeKind::Text,
        ModeKind::TurnBased,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModeKind::PushToTalk => "push_to_talk",
            ModeKind::AlwaysOn => "always_on",
            ModeKind::Text => "text",
            ModeKind::TurnBased => "turn_based",
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            ModeKind::PushToTalk => &["ptt"],
            ModeKind::AlwaysOn => &["continuous"],
            ModeKind::Text => &["type"],
            ModeKind::TurnBased => &["turns"],
        }
    }

    /// 1-based menu number
    pub fn number(self) -> usize {
        match self {
            ModeKind::PushToTalk => 1,
            ModeKind::AlwaysOn => 2,
            ModeKind::Text => 3,
            ModeKind::TurnBased => 4,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ModeKind::PushToTalk => "Hold space to record",
            ModeKind::AlwaysOn => "Continuous listening",
            ModeKind::Text => "Type messages",
            ModeKind::TurnBased => "Take turns speaking",
        }
    }
}

impl std::fmt::Display for ModeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an unrecognized mode selector
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}' (expected 1-4 or one of push_to_talk, always_on, text, turn_based)")]
pub struct UnknownMode(pub String);

impl FromStr for ModeKind {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', ' '], "_");

        ModeKind::ALL
            .into_iter()
            .find(|kind| {
                wanted == kind.name()
                    || wanted == kind.number().to_string()
                    || kind.aliases().contains(&wanted.as_str())
            })
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// Where a mode takes its input from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputStyle {
    /// Raw key press/release edges
    Keys,
    /// Whole lines typed at a prompt
    Lines,
}

/// Tunables shared by the modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSettings {
    /// Push-to-talk presses shorter than this are cancelled
    pub min_hold: Duration,
}

impl ModeSettings {
    pub const DEFAULT_MIN_HOLD: Duration = Duration::from_millis(200);
}

impl Default for ModeSettings {
    fn default() -> Self {
        Self {
            min_hold: Self::DEFAULT_MIN_HOLD,
        }
    }
}

/// An interaction policy mapping key/text events to engine calls
///
/// Handlers return what they did so the CLI can report it. An `Err` means
/// the engine call failed and the interaction was abandoned; the mode is
/// left in a state where the next event starts fresh.
#[async_trait]
pub trait Mode: Send {
    fn kind(&self) -> ModeKind;

    /// One-line key help
    fn help(&self) -> &'static str;

    fn input_style(&self) -> InputStyle {
        InputStyle::Keys
    }

    /// Keys whose edges should be routed to this mode
    fn bound_keys(&self) -> &'static [&'static str] {
        &[]
    }

    async fn start(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn on_key_down(&mut self, _key: &str) -> Result<ModeAction, EngineError> {
        Ok(ModeAction::Ignored)
    }

    async fn on_key_up(&mut self, _key: &str) -> Result<ModeAction, EngineError> {
        Ok(ModeAction::Ignored)
    }

    /// Returns the text actually sent, or `None` if nothing was
    async fn on_text_input(&mut self, _text: &str) -> Result<Option<String>, EngineError> {
        Ok(None)
    }

    /// The assistant finished responding
    fn on_response_complete(&mut self) {}

    /// Short human-readable state
    fn status(&self) -> String;
}

/// Build a mode from a selector (name, alias or menu number)
pub fn create_mode(
    name: &str,
    engine: Arc<dyn Engine>,
    settings: ModeSettings,
) -> Option<Box<dyn Mode>> {
    let kind = name.parse::<ModeKind>().ok()?;
    Some(build_mode(kind, engine, settings))
}

fn build_mode(kind: ModeKind, engine: Arc<dyn Engine>, settings: ModeSettings) -> Box<dyn Mode> {
    match kind {
        ModeKind::PushToTalk => Box::new(PushToTalkMode::new(engine, settings.min_hold)),
        ModeKind::AlwaysOn => Box::new(AlwaysOnMode::new(engine)),
        ModeKind::Text => Box::new(TextMode::new(engine)),
        ModeKind::TurnBased => Box::new(TurnBasedMode::new(engine)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::MockEngine;

    #[test]
    fn test_parse_names_and_aliases() {
        let cases = [
            ("push_to_talk", ModeKind::PushToTalk),
            ("ptt", ModeKind::PushToTalk),
            ("always_on", ModeKind::AlwaysOn),
            ("continuous", ModeKind::AlwaysOn),
            ("text", ModeKind::Text),
            ("type", ModeKind::Text),
            ("turn_based", ModeKind::TurnBased),
            ("turns", ModeKind::TurnBased),
        ];

        for (name, expected) in cases {
            assert_eq!(name.parse::<ModeKind>().unwrap(), expected, "{}", name);
        }
    }

    #[test]
    fn test_parse_numbers_and_spelling() {
        assert_eq!("1".parse::<ModeKind>().unwrap(), ModeKind::PushToTalk);
        assert_eq!("4".parse::<ModeKind>().unwrap(), ModeKind::TurnBased);
        assert_eq!("Push-To-Talk".parse::<ModeKind>().unwrap(), ModeKind::PushToTalk);
        assert_eq!(" always on ".parse::<ModeKind>().unwrap(), ModeKind::AlwaysOn);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "invalid_mode".parse::<ModeKind>().unwrap_err();
        assert_eq!(err, UnknownMode("invalid_mode".into()));
        assert!("5".parse::<ModeKind>().is_err());
        assert!("".parse::<ModeKind>().is_err());
    }

    #[test]
    fn test_numbers_match_menu_order() {
        for (i, kind) in ModeKind::ALL.iter().enumerate() {
            assert_eq!(kind.number(), i + 1);
        }
    }

    #[test]
    fn test_factory() {
        let engine: Arc<dyn Engine> = Arc::new(MockEngine::new());

        for alias in ["ptt", "continuous", "type", "turns"] {
            let mode = create_mode(alias, Arc::clone(&engine), ModeSettings::default())
                .unwrap_or_else(|| panic!("failed to create {}", alias));
            assert_eq!(Some(mode.kind()), alias.parse::<ModeKind>().ok());
        }

        for kind in ModeKind::ALL {
            let mode = create_mode(kind.name(), Arc::clone(&engine), ModeSettings::default());
            assert_eq!(mode.map(|m| m.kind()), Some(kind));
        }

        assert!(create_mode("invalid_mode", engine, ModeSettings::default()).is_none());
    }

    #[test]
    fn test_input_styles() {
        let engine: Arc<dyn Engine> = Arc::new(MockEngine::new());
        for kind in ModeKind::ALL {
            let mode = build_mode(kind, Arc::clone(&engine), ModeSettings::default());
            let expected = if kind == ModeKind::Text {
                InputStyle::Lines
            } else {
                InputStyle::Keys
            };
            assert_eq!(mode.input_style(), expected);
        }
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ModeKind::TurnBased).unwrap();
        assert_eq!(json, r#""turn_based""#);
    }
}
