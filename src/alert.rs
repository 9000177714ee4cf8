//! Local alert actions fired when the alarm goes active.
//!
//! Alerts are best-effort: implementations must return promptly and swallow
//! their own failures, since they are invoked from the reconcile loop.

use std::fmt::Debug;
use std::io::Write;
use std::process::Stdio;

use tracing::{debug, warn};

/// Sink for alert side effects.
pub trait AlertSink: Send + Debug {
    /// Play an audible alarm.
    fn play_alarm_sound(&self);

    /// Show a desktop notification.
    fn show_notification(&self, title: &str, body: &str);
}

/// An alert sink that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAlert;

impl AlertSink for SilentAlert {
    fn play_alarm_sound(&self) {}

    fn show_notification(&self, _title: &str, _body: &str) {}
}

/// Alerts through the controlling terminal and an optional notifier command.
///
/// The sound is the terminal bell. Notifications are delivered by spawning
/// `notify_command title body` (for example `notify-send`); the child is
/// reaped in the background and never awaited by the caller.
#[derive(Debug, Clone)]
pub struct TerminalAlert {
    sound: bool,
    notify_command: Option<String>,
}

impl TerminalAlert {
    pub fn new(sound: bool, notify_command: Option<String>) -> Self {
        let notify_command = notify_command.filter(|cmd| !cmd.trim().is_empty());
        Self {
            sound,
            notify_command,
        }
    }
}

impl AlertSink for TerminalAlert {
    fn play_alarm_sound(&self) {
        if !self.sound {
            return;
        }
        let mut stderr = std::io::stderr();
        if let Err(e) = stderr.write_all(b"\x07").and_then(|_| stderr.flush()) {
            debug!("Failed to ring terminal bell: {}", e);
        }
    }

    fn show_notification(&self, title: &str, body: &str) {
        let Some(ref command) = self.notify_command else {
            return;
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime available, skipping notification");
            return;
        };

        let spawned = tokio::process::Command::new(command)
            .arg(title)
            .arg(body)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => {
                let command = command.clone();
                runtime.spawn(async move {
                    match child.wait().await {
                        Ok(status) if !status.success() => {
                            warn!("Notifier {} exited with {}", command, status);
                        }
                        Ok(_) => {}
                        Err(e) => warn!("Notifier {} failed: {}", command, e),
                    }
                });
            }
            Err(e) => warn!("Failed to spawn notifier {}: {}", command, e),
        }
    }
}
