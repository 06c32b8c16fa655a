//! Pass-through settings handed to the engine

use serde::Serialize;

use crate::modes::ModeKind;

/// Latency profile requested from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyMode {
    /// Fine for typed chat
    Standard,
    /// Voice modes
    UltraLow,
}

impl std::fmt::Display for LatencyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LatencyMode::Standard => write!(f, "standard"),
            LatencyMode::UltraLow => write!(f, "ultra_low"),
        }
    }
}

/// Engine configuration derived from CLI settings and the selected mode
#[derive(Clone, Serialize)]
pub struct EngineConfig {
    /// Backend credential, passed through untouched
    #[serde(skip)]
    pub api_key: Option<String>,
    pub voice: String,
    pub latency_mode: LatencyMode,
    /// Server-side voice activity detection; only always-on relies on it
    pub vad_enabled: bool,
    pub chunk_duration_ms: u32,
}

impl EngineConfig {
    pub const DEFAULT_VOICE: &'static str = "alloy";
    pub const DEFAULT_CHUNK_MS: u32 = 100;

    /// Settings appropriate for the given interaction mode
    pub fn for_mode(kind: ModeKind, api_key: Option<String>, voice: impl Into<String>) -> Self {
        let latency_mode = match kind {
            ModeKind::Text => LatencyMode::Standard,
            _ => LatencyMode::UltraLow,
        };

        Self {
            api_key,
            voice: voice.into(),
            latency_mode,
            vad_enabled: kind == ModeKind::AlwaysOn,
            chunk_duration_ms: Self::DEFAULT_CHUNK_MS,
        }
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("voice", &self.voice)
            .field("latency_mode", &self.latency_mode)
            .field("vad_enabled", &self.vad_enabled)
            .field("chunk_duration_ms", &self.chunk_duration_ms)
            .finish()
    }
}
