//! Channel-based telemetry source.
//!
//! Receives deliveries via a tokio mpsc channel. This is useful for
//! embedding the dashboard in a process that already talks to the device,
//! and for tests.

use tokio::sync::mpsc;

use super::{Delivery, Subscription, TelemetrySource, DELIVERY_BUFFER};
use crate::error::SourceError;

/// A telemetry source fed by an in-memory channel.
///
/// The producer sends deliveries that are already scoped to the device,
/// so the device path passed to `subscribe` only labels the subscription.
///
/// # Example
///
/// ```
/// use firewatch::ChannelSource;
///
/// let (tx, source) = ChannelSource::create("esp32 bridge");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: Option<mpsc::Receiver<Delivery>>,
    description: String,
}

impl ChannelSource {
    /// Create a new channel source from the receiving end of a channel.
    pub fn new(receiver: mpsc::Receiver<Delivery>, source_description: &str) -> Self {
        Self {
            receiver: Some(receiver),
            description: format!("channel: {}", source_description),
        }
    }

    /// Create a channel pair for sending deliveries to a ChannelSource.
    pub fn create(source_description: &str) -> (mpsc::Sender<Delivery>, Self) {
        let (tx, rx) = mpsc::channel(DELIVERY_BUFFER);
        (tx, Self::new(rx, source_description))
    }
}

impl TelemetrySource for ChannelSource {
    fn subscribe(&mut self, device_path: &str) -> Result<Subscription, SourceError> {
        let receiver = self
            .receiver
            .take()
            .ok_or_else(|| SourceError::AlreadySubscribed(self.description.clone()))?;
        let description = format!("{} {}", self.description, device_path);
        Ok(Subscription::new(receiver, None, &description))
    }

    fn description(&self) -> &str {
        &self.description
    }
}
