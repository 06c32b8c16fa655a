//! Engine module: the seam to the voice/chat runtime
//!
//! The CLI never talks to audio devices or the network itself. Everything
//! goes through an [`Engine`], and the engine reports back through
//! [`EngineEvent`](crate::events::EngineEvent)s on a channel handed to it at
//! construction.

mod config;
mod loopback;

pub use config::EngineConfig;
pub use loopback::LoopbackEngine;

use async_trait::async_trait;

/// Async surface of a real-time voice/chat engine
#[async_trait]
pub trait Engine: Send + Sync {
    /// Open the session with the backend
    async fn connect(&self) -> Result<(), EngineError>;

    /// Close the session. Disconnecting an unconnected engine is a no-op.
    async fn disconnect(&self) -> Result<(), EngineError>;

    /// Send a typed user message
    async fn send_text(&self, text: &str) -> Result<(), EngineError>;

    /// Begin capturing microphone audio
    async fn start_listening(&self) -> Result<(), EngineError>;

    /// Stop capturing and commit whatever is still buffered
    async fn stop_listening(&self) -> Result<(), EngineError>;

    /// Drop buffered audio that has not been committed yet
    async fn clear_audio_buffer(&self) -> Result<(), EngineError>;

    fn is_connected(&self) -> bool;
}

/// Errors reported by engines
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine is not connected")]
    NotConnected,

    #[error("engine is already connected")]
    AlreadyConnected,

    #[error("engine is not listening")]
    NotListening,

    #[error("engine event channel closed")]
    Closed,
}

#[cfg(test)]
pub(crate) mod mock {
    //! Recording engine for mode and CLI tests

    use std::sync::Mutex;

    use super::*;

    /// One recorded engine call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Connect,
        Disconnect,
        SendText(String),
        StartListening,
        StopListening,
        ClearAudioBuffer,
    }

    #[derive(Default)]
    pub struct MockEngine {
        calls: Mutex<Vec<Call>>,
        connected: std::sync::atomic::AtomicBool,
        fail_sends: bool,
    }

    impl MockEngine {
        pub fn new() -> Self {
            Self::default()
        }

        /// An engine whose `send_text` always fails as if the session dropped
        pub fn failing() -> Self {
            Self {
                fail_sends: true,
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl Engine for MockEngine {
        async fn connect(&self) -> Result<(), EngineError> {
            self.connected
                .store(true, std::sync::atomic::Ordering::SeqCst);
            self.record(Call::Connect);
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), EngineError> {
            self.connected
                .store(false, std::sync::atomic::Ordering::SeqCst);
            self.record(Call::Disconnect);
            Ok(())
        }

        async fn send_text(&self, text: &str) -> Result<(), EngineError> {
            if self.fail_sends {
                return Err(EngineError::NotConnected);
            }
            self.record(Call::SendText(text.to_string()));
            Ok(())
        }

        async fn start_listening(&self) -> Result<(), EngineError> {
            self.record(Call::StartListening);
            Ok(())
        }

        async fn stop_listening(&self) -> Result<(), EngineError> {
            self.record(Call::StopListening);
            Ok(())
        }

        async fn clear_audio_buffer(&self) -> Result<(), EngineError> {
            self.record(Call::ClearAudioBuffer);
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected.load(std::sync::atomic::Ordering::SeqCst)
        }
    }
}
