//! File-based telemetry source.
//!
//! Polls a JSON file holding the device tree (for example a periodic
//! export of the realtime database).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{Delivery, Subscription, TelemetrySource, DELIVERY_BUFFER};
use crate::error::SourceError;

/// Default polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A telemetry source that reads a JSON file on an interval.
///
/// The source tracks the file's modification time and only delivers when
/// the file has changed. A file that cannot be read delivers
/// [`Delivery::Absent`] once, until it becomes readable again.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    interval: Duration,
    description: String,
    subscribed: bool,
}

/// Outcome of one poll.
#[derive(Debug, PartialEq)]
enum Poll {
    Unchanged,
    Changed(Delivery),
    Unreadable(String),
    Malformed(String),
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P, interval: Duration) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            interval,
            description,
            subscribed: false,
        }
    }

    /// Returns the path being monitored.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file once and select the device node.
    pub fn read_once(&self, device_path: &str) -> Result<Delivery, SourceError> {
        let content = fs::read(&self.path)?;
        let value = serde_json::from_slice(&content)?;
        Ok(Delivery::at_path(value, device_path))
    }
}

impl TelemetrySource for FileSource {
    fn subscribe(&mut self, device_path: &str) -> Result<Subscription, SourceError> {
        if self.subscribed {
            return Err(SourceError::AlreadySubscribed(self.description.clone()));
        }
        self.subscribed = true;

        let (tx, rx) = mpsc::channel(DELIVERY_BUFFER);
        let mut poller = Poller {
            path: self.path.clone(),
            device_path: device_path.to_string(),
            last_modified: None,
            unreadable: false,
        };
        let interval = self.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let delivery = match poller.poll() {
                    Poll::Unchanged => continue,
                    Poll::Changed(delivery) => delivery,
                    Poll::Unreadable(e) => {
                        warn!("Read error: {}", e);
                        Delivery::Absent
                    }
                    Poll::Malformed(e) => {
                        warn!("Parse error: {}", e);
                        continue;
                    }
                };
                if tx.send(delivery).await.is_err() {
                    break;
                }
            }
        });

        Ok(Subscription::new(rx, Some(task), &self.description))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[derive(Debug)]
struct Poller {
    path: PathBuf,
    device_path: String,
    last_modified: Option<SystemTime>,
    unreadable: bool,
}

impl Poller {
    fn poll(&mut self) -> Poll {
        let modified = fs::metadata(&self.path).and_then(|m| m.modified());

        let modified = match modified {
            Ok(modified) => modified,
            Err(e) => return self.unreadable(e.to_string()),
        };

        let changed = self.unreadable || self.last_modified.is_none_or(|last| modified > last);
        if !changed {
            return Poll::Unchanged;
        }

        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) => return self.unreadable(e.to_string()),
        };
        self.unreadable = false;
        self.last_modified = Some(modified);

        match serde_json::from_slice(&content) {
            Ok(value) => {
                debug!("Read {} bytes from {}", content.len(), self.path.display());
                Poll::Changed(Delivery::at_path(value, &self.device_path))
            }
            Err(e) => Poll::Malformed(e.to_string()),
        }
    }

    fn unreadable(&mut self, error: String) -> Poll {
        if self.unreadable {
            return Poll::Unchanged;
        }
        self.unreadable = true;
        self.last_modified = None;
        Poll::Unreadable(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample_json() -> &'static str {
        r#"{"devices": {"esp32_1": {"temperature": 30.5, "gas": 900, "alarm": false}}}"#
    }

    fn poller(path: &Path) -> Poller {
        Poller {
            path: path.to_path_buf(),
            device_path: "/devices/esp32_1".to_string(),
            last_modified: None,
            unreadable: false,
        }
    }

    #[test]
    fn test_file_source_new() {
        let source = FileSource::new("/tmp/telemetry.json", DEFAULT_POLL_INTERVAL);
        assert_eq!(source.path(), Path::new("/tmp/telemetry.json"));
        assert_eq!(source.description(), "file: /tmp/telemetry.json");
    }

    #[test]
    fn test_poll_reads_then_waits_for_change() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let mut poller = poller(file.path());
        assert_eq!(
            poller.poll(),
            Poll::Changed(Delivery::Present(
                json!({"temperature": 30.5, "gas": 900, "alarm": false})
            ))
        );
        assert_eq!(poller.poll(), Poll::Unchanged);
    }

    #[test]
    fn test_missing_file_is_absent_once() {
        let mut poller = poller(Path::new("/nonexistent/path/telemetry.json"));
        assert!(matches!(poller.poll(), Poll::Unreadable(_)));
        assert_eq!(poller.poll(), Poll::Unchanged);
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let mut poller = poller(file.path());
        assert!(matches!(poller.poll(), Poll::Malformed(_)));
    }

    #[test]
    fn test_missing_device_node_is_absent() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"devices": {{}}}}"#).unwrap();

        let mut poller = poller(file.path());
        assert_eq!(poller.poll(), Poll::Changed(Delivery::Absent));
    }

    #[test]
    fn test_read_once() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let source = FileSource::new(file.path(), DEFAULT_POLL_INTERVAL);
        let delivery = source.read_once("/devices/esp32_1").unwrap();
        assert!(matches!(delivery, Delivery::Present(_)));
        assert!(source.read_once("/devices/other").unwrap().is_absent());
    }

    #[tokio::test]
    async fn test_file_source_subscription() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let mut source = FileSource::new(file.path(), Duration::from_millis(10));
        let mut subscription = source.subscribe("/devices/esp32_1").unwrap();
        assert!(matches!(subscription.recv().await, Some(Delivery::Present(_))));

        assert!(matches!(
            source.subscribe("/devices/esp32_1"),
            Err(SourceError::AlreadySubscribed(_))
        ));
    }
}
