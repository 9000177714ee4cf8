//! Telemetry source abstraction.
//!
//! A [`TelemetrySource`] pushes deliveries for one device path into an
//! ordered channel. The returned [`Subscription`] owns the background task
//! feeding that channel; dropping it (or calling
//! [`Subscription::unsubscribe`]) stops the task.

mod channel;
mod file;
#[cfg(feature = "rtdb")]
mod rtdb;
mod stream;

pub use channel::ChannelSource;
pub use file::{FileSource, DEFAULT_POLL_INTERVAL};
#[cfg(feature = "rtdb")]
pub use rtdb::RtdbSource;
pub use stream::StreamSource;

use std::fmt::Debug;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::SourceError;

/// Buffer size for delivery channels.
pub(crate) const DELIVERY_BUFFER: usize = 64;

/// One push from a telemetry source.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// A structured payload for the device.
    Present(Value),
    /// The device node holds no value.
    Absent,
}

impl Delivery {
    /// Wrap a JSON value, treating `null` as absent.
    pub fn from_value(value: Value) -> Self {
        if value.is_null() {
            Delivery::Absent
        } else {
            Delivery::Present(value)
        }
    }

    /// Select the node at `device_path` inside a whole document.
    ///
    /// The path uses JSON Pointer syntax (`/devices/esp32_1`). `""` and
    /// `"/"` address the root. A missing node is absent.
    pub fn at_path(root: Value, device_path: &str) -> Self {
        let pointer = device_path.trim_end_matches('/');
        if pointer.is_empty() {
            return Self::from_value(root);
        }
        let pointer = if pointer.starts_with('/') {
            pointer.to_string()
        } else {
            format!("/{}", pointer)
        };
        match root.pointer(&pointer) {
            Some(node) => Self::from_value(node.clone()),
            None => Delivery::Absent,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Delivery::Absent)
    }
}

/// Trait for subscribing to telemetry from various sources.
///
/// Implementations push snapshots from different backends: file polling,
/// newline-delimited JSON streams, a realtime database, or in-memory
/// channels. Each source hands out a single subscription.
///
/// # Example
///
/// ```
/// use firewatch::{ChannelSource, Delivery, TelemetrySource};
///
/// # tokio_test::block_on(async {
/// let (tx, mut source) = ChannelSource::create("example");
/// let mut subscription = source.subscribe("/devices/esp32_1").unwrap();
///
/// tx.send(Delivery::Absent).await.unwrap();
/// assert_eq!(subscription.recv().await, Some(Delivery::Absent));
/// # });
/// ```
pub trait TelemetrySource: Send + Debug {
    /// Start delivering values for `device_path`.
    ///
    /// Must be called from within a tokio runtime.
    fn subscribe(&mut self, device_path: &str) -> Result<Subscription, SourceError>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;
}

/// Live subscription to a telemetry source.
///
/// Deliveries arrive in the order the source produced them.
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::Receiver<Delivery>,
    task: Option<JoinHandle<()>>,
    description: String,
}

impl Subscription {
    /// Wrap a delivery channel and the task feeding it, if any.
    pub fn new(
        receiver: mpsc::Receiver<Delivery>,
        task: Option<JoinHandle<()>>,
        description: &str,
    ) -> Self {
        Self {
            receiver,
            task,
            description: description.to_string(),
        }
    }

    /// Wait for the next delivery. `None` once the source has finished.
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.receiver.recv().await
    }

    /// Take the next delivery if one is ready.
    pub fn try_recv(&mut self) -> Option<Delivery> {
        self.receiver.try_recv().ok()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Release the subscription.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.receiver.close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
