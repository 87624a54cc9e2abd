//! IPC utilities for Unix socket communication
//!
//! The backend (or `session-monitor push`) sends `UpdateEvent`s to the
//! monitor as newline-delimited JSON over a Unix socket.

use crate::bridge::UpdateEvent;
use crate::error::Result;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tracing::debug;

/// Default socket path for the monitor.
pub fn socket_path() -> std::path::PathBuf {
    std::env::temp_dir().join("session-monitor.sock")
}

/// Send one event as a JSON line
pub async fn send_event(path: &Path, event: &UpdateEvent) -> Result<()> {
    let mut line = serde_json::to_string(event)?;
    line.push('\n');

    let mut stream = UnixStream::connect(path).await?;
    stream.write_all(line.as_bytes()).await?;
    stream.shutdown().await?;
    debug!(event = event.name(), "sent to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn socket_path_in_temp_dir() {
        let path = socket_path();
        assert!(path.starts_with(std::env::temp_dir()));
        assert_eq!(path.file_name().unwrap(), "session-monitor.sock");
    }

    #[tokio::test]
    async fn send_without_listener_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = send_event(
            &dir.path().join("missing.sock"),
            &UpdateEvent::SessionsUpdated(Vec::new()),
        )
        .await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
