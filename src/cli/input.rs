//! Line input for line-driven modes
//!
//! Stdin is read on a detached thread. A blocking read cannot be cancelled,
//! and one parked on the runtime's blocking pool keeps the process alive
//! after the session ends, so the reader is never joined. It exits on EOF,
//! on a read error, or once the receiver is gone.

use std::io::{self, BufRead};
use std::thread;

use tokio::sync::mpsc;
use tracing::debug;

/// Spawn a thread forwarding lines from `reader`, without line endings
///
/// The channel closes when the input ends. A read error is forwarded
/// before closing.
pub fn spawn_line_reader<R>(mut reader: R, tx: mpsc::Sender<io::Result<String>>) -> io::Result<()>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("line-reader".to_string())
        .spawn(move || {
            loop {
                let mut line = String::new();
                let item = match reader.read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => Ok(line.trim_end_matches(['\r', '\n']).to_string()),
                    Err(e) => Err(e),
                };

                let failed = item.is_err();
                if tx.blocking_send(item).is_err() || failed {
                    break;
                }
            }
            debug!("line reader stopped");
        })?;
    Ok(())
}

/// Input that blocks every read until the paired sender is dropped, like a
/// terminal nobody types into
#[cfg(test)]
pub(crate) struct BlockedInput(pub std::sync::mpsc::Receiver<()>);

#[cfg(test)]
impl io::Read for BlockedInput {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        let _ = self.0.recv();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::mpsc as std_mpsc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_lines_then_close() {
        let (tx, mut rx) = mpsc::channel(4);
        spawn_line_reader(Cursor::new("hello\r\n\n/quit\nlast"), tx).unwrap();

        assert_eq!(rx.recv().await.unwrap().unwrap(), "hello");
        assert_eq!(rx.recv().await.unwrap().unwrap(), "");
        assert_eq!(rx.recv().await.unwrap().unwrap(), "/quit");
        assert_eq!(rx.recv().await.unwrap().unwrap(), "last");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_blocked_reader_does_not_hold_receiver() {
        let (unblock, blocked) = std_mpsc::channel::<()>();
        let (tx, mut rx) = mpsc::channel(1);
        spawn_line_reader(io::BufReader::new(BlockedInput(blocked)), tx).unwrap();

        let pending = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(pending.is_err());

        drop(unblock);
        assert!(rx.recv().await.is_none());
    }
}
