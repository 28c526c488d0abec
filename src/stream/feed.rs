//! Stream-based sample feed.
//!
//! Reads property samples from an async byte stream and appends them to a
//! [`HistoryStore`]. This is how live data reaches the chart: a TCP
//! connection to a bridge, or bytes pushed from another transport.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::HistoryStore;
use crate::api::PropertyRecord;

/// One line of the feed: a sample for a twin.
///
/// ```json
/// {"dt":"patient-1","property":{"key":"heart-rate","value":{"valueMap":{"timestamp":{"value":1700000000000},"bpm":{"value":72}}}}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamMessage {
    pub dt: String,
    pub property: PropertyRecord,
}

/// Background task appending newline-delimited [`StreamMessage`]s to a store.
///
/// The task stops at end of stream, on a read error, or when the feed is
/// dropped.
#[derive(Debug)]
pub struct StreamFeed {
    description: String,
    last_error: Arc<Mutex<Option<String>>>,
    task: JoinHandle<()>,
}

impl StreamFeed {
    /// Spawn a background task that reads from the given async reader.
    ///
    /// Lines that fail to parse, including lines that are not valid UTF-8,
    /// are skipped and reported via [`last_error`](Self::last_error).
    pub fn spawn<R>(reader: R, store: HistoryStore, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let last_error = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();
        let desc = description.to_string();

        let task = tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = Vec::new();

            loop {
                line.clear();
                match reader.read_until(b'\n', &mut line).await {
                    Ok(0) => {
                        info!("Stream {} closed", desc);
                        *error_handle.lock() = Some("Connection closed".to_string());
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim_ascii();
                        if trimmed.is_empty() {
                            continue;
                        }
                        // Undecodable bytes are a parse error for this line only.
                        match serde_json::from_slice::<StreamMessage>(trimmed) {
                            Ok(msg) => {
                                *error_handle.lock() = None;
                                debug!("Sample {}/{}", msg.dt, msg.property.key);
                                store.append(&msg.dt, msg.property);
                            }
                            Err(e) => {
                                warn!("Skipping malformed stream line: {}", e);
                                *error_handle.lock() = Some(format!("Parse error: {}", e));
                            }
                        }
                    }
                    Err(e) => {
                        warn!("Stream {} read error: {}", desc, e);
                        *error_handle.lock() = Some(format!("Read error: {}", e));
                        break;
                    }
                }
            }
        });

        Self {
            description: format!("stream: {}", description),
            last_error,
            task,
        }
    }

    /// Create a feed from a channel of raw JSON messages (one message per item).
    ///
    /// Useful when samples are pushed from another transport without an
    /// `AsyncRead`.
    pub fn from_bytes_channel(
        mut rx: mpsc::Receiver<Vec<u8>>,
        store: HistoryStore,
        description: &str,
    ) -> Self {
        let last_error = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();

        let task = tokio::spawn(async move {
            while let Some(bytes) = rx.recv().await {
                match serde_json::from_slice::<StreamMessage>(&bytes) {
                    Ok(msg) => {
                        *error_handle.lock() = None;
                        store.append(&msg.dt, msg.property);
                    }
                    Err(e) => {
                        warn!("Skipping malformed stream message: {}", e);
                        *error_handle.lock() = Some(format!("Parse error: {}", e));
                    }
                }
            }
        });

        Self {
            description: format!("stream: {}", description),
            last_error,
            task,
        }
    }

    /// Returns a human-readable description of the feed.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get the last error message, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    /// Returns true once the background task has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for StreamFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}
