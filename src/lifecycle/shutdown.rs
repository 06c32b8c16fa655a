//! Signal handling for graceful shutdown

use std::io;

use tracing::debug;

/// Handles shutdown signals (Ctrl+C, and SIGTERM on unix)
///
/// In raw terminal mode Ctrl+C arrives as a key event instead of SIGINT,
/// so key-driven modes also bind it directly.
pub struct ShutdownSignal;

impl ShutdownSignal {
    /// Create a new shutdown signal handler
    pub fn new() -> Self {
        Self
    }

    /// Wait for a shutdown signal
    #[cfg(unix)]
    pub async fn wait(&self) -> io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigterm.recv() => {
                debug!("received SIGTERM");
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                debug!("received SIGINT");
            }
        }
        Ok(())
    }

    /// Wait for a shutdown signal
    #[cfg(not(unix))]
    pub async fn wait(&self) -> io::Result<()> {
        tokio::signal::ctrl_c().await?;
        debug!("received Ctrl+C");
        Ok(())
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
