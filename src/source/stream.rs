//! Stream-based telemetry source.
//!
//! Receives JSON documents from an async byte stream. This is useful for
//! network feeds like a TCP bridge in front of the device.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{Delivery, Subscription, TelemetrySource, DELIVERY_BUFFER};
use crate::error::SourceError;

enum Input {
    Reader(Box<dyn AsyncRead + Unpin + Send>),
    Bytes(mpsc::Receiver<Vec<u8>>),
}

impl std::fmt::Debug for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Input::Reader(_) => f.write_str("Reader"),
            Input::Bytes(_) => f.write_str("Bytes"),
        }
    }
}

/// A telemetry source that reads JSON documents from an async stream.
///
/// Each line (or each message, for byte channels) is one JSON document.
/// The device node is selected from the document with
/// [`Delivery::at_path`]. Lines that fail to parse are logged and skipped;
/// the end of the stream delivers [`Delivery::Absent`] so the dashboard
/// drops to "no data".
///
/// # Example with a byte stream
///
/// ```
/// use std::io::Cursor;
/// use firewatch::StreamSource;
///
/// let data = b"{\"gas\": 512}\n";
/// let source = StreamSource::new(Cursor::new(data.to_vec()), "example");
/// ```
#[derive(Debug)]
pub struct StreamSource {
    input: Option<Input>,
    description: String,
}

impl StreamSource {
    /// Create a source over newline-delimited JSON from `reader`.
    pub fn new<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self {
            input: Some(Input::Reader(Box::new(reader))),
            description: format!("stream: {}", description),
        }
    }

    /// Connect to a TCP endpoint serving newline-delimited JSON.
    pub async fn connect(addr: &str) -> Result<Self, SourceError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| SourceError::Connection(format!("{}: {}", addr, e)))?;
        info!("Connected to {}", addr);
        Ok(Self::new(stream, addr))
    }

    /// Create a StreamSource from a raw bytes channel.
    ///
    /// Each message is parsed as one complete JSON document.
    pub fn from_bytes_channel(rx: mpsc::Receiver<Vec<u8>>, description: &str) -> Self {
        Self {
            input: Some(Input::Bytes(rx)),
            description: format!("stream: {}", description),
        }
    }
}

impl TelemetrySource for StreamSource {
    fn subscribe(&mut self, device_path: &str) -> Result<Subscription, SourceError> {
        let input = self
            .input
            .take()
            .ok_or_else(|| SourceError::AlreadySubscribed(self.description.clone()))?;
        let (tx, rx) = mpsc::channel(DELIVERY_BUFFER);
        let path = device_path.to_string();

        let task = match input {
            Input::Reader(reader) => tokio::spawn(read_lines(reader, path, tx)),
            Input::Bytes(bytes) => tokio::spawn(read_messages(bytes, path, tx)),
        };

        Ok(Subscription::new(rx, Some(task), &self.description))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

fn decode(bytes: &[u8], device_path: &str) -> Option<Delivery> {
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(Delivery::at_path(value, device_path)),
        Err(e) => {
            warn!("Skipping malformed payload: {}", e);
            None
        }
    }
}

async fn read_lines(
    reader: Box<dyn AsyncRead + Unpin + Send>,
    device_path: String,
    tx: mpsc::Sender<Delivery>,
) {
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        // Raw bytes: a line with invalid UTF-8 is skipped by `decode`
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => {
                info!("Telemetry stream closed");
                break;
            }
            Ok(_) => {
                let trimmed = line.trim_ascii();
                if trimmed.is_empty() {
                    continue;
                }
                if let Some(delivery) = decode(trimmed, &device_path) {
                    debug!("Stream delivery (absent: {})", delivery.is_absent());
                    if tx.send(delivery).await.is_err() {
                        // Subscriber dropped
                        return;
                    }
                }
            }
            Err(e) => {
                warn!("Telemetry stream read error: {}", e);
                break;
            }
        }
    }

    let _ = tx.send(Delivery::Absent).await;
}

async fn read_messages(
    mut rx: mpsc::Receiver<Vec<u8>>,
    device_path: String,
    tx: mpsc::Sender<Delivery>,
) {
    while let Some(bytes) = rx.recv().await {
        if let Some(delivery) = decode(&bytes, &device_path) {
            if tx.send(delivery).await.is_err() {
                return;
            }
        }
    }

    info!("Telemetry byte channel closed");
    let _ = tx.send(Delivery::Absent).await;
}
