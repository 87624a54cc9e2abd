//! Unix socket server for receiving backend pushes
//!
//! Listens on `/tmp/session-monitor.sock` for newline-delimited JSON messages.
//! Each message is deserialized directly as an `UpdateEvent` and handed to
//! the update bridge.

use crate::bridge::{UpdateBridge, UpdateEvent};
use crate::ipc;
use crate::store::SessionStore;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UnixListener;
use tracing::{debug, info, trace, warn};

/// Start the server on the default socket path.
pub async fn start(store: SessionStore) {
    start_at(&ipc::socket_path(), store).await;
}

/// Start the server on `path`.
///
/// Removes any stale socket file, binds to the path, and spawns a task per
/// connection. Returns only if binding fails.
pub async fn start_at(path: &Path, store: SessionStore) {
    // Remove stale socket if it exists
    if path.exists()
        && let Err(e) = std::fs::remove_file(path)
    {
        warn!("Failed to remove stale socket {}: {}", path.display(), e);
        return;
    }

    let listener = match UnixListener::bind(path) {
        Ok(l) => l,
        Err(e) => {
            warn!("Failed to bind Unix socket {}: {}", path.display(), e);
            return;
        }
    };

    info!("IPC server listening on {}", path.display());

    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let store = store.clone();
                tokio::spawn(async move {
                    let reader = BufReader::new(stream);
                    let mut lines = reader.lines();

                    while let Ok(Some(line)) = lines.next_line().await {
                        if line.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<UpdateEvent>(&line) {
                            Ok(event) => {
                                debug!(event = event.name(), "ipc event");
                                UpdateBridge::apply(&store, event);
                            }
                            Err(e) => {
                                trace!("Failed to parse IPC message: {} (line: {})", e, line);
                            }
                        }
                    }
                });
            }
            Err(e) => {
                warn!("Failed to accept socket connection: {}", e);
            }
        }
    }
}
