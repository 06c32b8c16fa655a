//! Configuration loading and management

use std::time::Duration;

use clap::Args;

use crate::engine::EngineConfig;
use crate::keyboard::DEFAULT_REPEAT_WINDOW;
use crate::modes::{ModeKind, ModeSettings, UnknownMode};

const MAX_MIN_HOLD_MS: u64 = 5_000;
const REPEAT_WINDOW_RANGE_MS: std::ops::RangeInclusive<u64> = 50..=5_000;

/// Command-line and environment settings
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Interaction mode: name (push_to_talk, always_on, text, turn_based),
    /// alias (ptt, continuous, type, turns) or number 1-4
    #[arg(value_name = "MODE")]
    pub mode: Option<String>,

    /// Same as the positional MODE
    #[arg(long = "mode", value_name = "MODE", conflicts_with = "mode")]
    pub mode_flag: Option<String>,

    /// API key passed through to the engine
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Voice requested from the engine
    #[arg(long, env = "VOXTERM_VOICE", default_value = EngineConfig::DEFAULT_VOICE)]
    pub voice: String,

    /// Push-to-talk presses shorter than this many milliseconds are cancelled
    #[arg(long, env = "VOXTERM_MIN_HOLD_MS", default_value_t = 200)]
    pub min_hold_ms: u64,

    /// Without terminal release events, a key counts as released after
    /// this many milliseconds without auto-repeat
    #[arg(
        long,
        env = "VOXTERM_REPEAT_WINDOW_MS",
        default_value_t = DEFAULT_REPEAT_WINDOW.as_millis() as u64
    )]
    pub repeat_window_ms: u64,
}

/// Errors in user-supplied configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    UnknownMode(#[from] UnknownMode),

    #[error("--min-hold-ms must be at most 5000, got {0}")]
    MinHoldTooLong(u64),

    #[error("--repeat-window-ms must be between 50 and 5000, got {0}")]
    RepeatWindowOutOfRange(u64),
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` when the user should be asked
    pub mode: Option<ModeKind>,
    pub api_key: Option<String>,
    pub voice: String,
    pub min_hold: Duration,
    pub repeat_window: Duration,
}

impl Config {
    /// Validate settings gathered from arguments and environment
    pub fn load(settings: &Settings) -> Result<Self, ConfigError> {
        let mode = settings
            .mode
            .as_deref()
            .or(settings.mode_flag.as_deref())
            .map(str::parse::<ModeKind>)
            .transpose()?;

        if settings.min_hold_ms > MAX_MIN_HOLD_MS {
            return Err(ConfigError::MinHoldTooLong(settings.min_hold_ms));
        }
        if !REPEAT_WINDOW_RANGE_MS.contains(&settings.repeat_window_ms) {
            return Err(ConfigError::RepeatWindowOutOfRange(settings.repeat_window_ms));
        }

        let api_key = settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string);

        Ok(Self {
            mode,
            api_key,
            voice: settings.voice.clone(),
            min_hold: Duration::from_millis(settings.min_hold_ms),
            repeat_window: Duration::from_millis(settings.repeat_window_ms),
        })
    }

    pub fn mode_settings(&self) -> ModeSettings {
        ModeSettings {
            min_hold: self.min_hold,
        }
    }

    pub fn engine_config(&self, kind: ModeKind) -> EngineConfig {
        EngineConfig::for_mode(kind, self.api_key.clone(), self.voice.clone())
    }
}
