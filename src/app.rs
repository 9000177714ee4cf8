//! Application state and navigation logic.

use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::reconciler::DashboardView;
use crate::telemetry::{Level, Thresholds};
use crate::ui::Theme;

/// Default file written by the in-app export.
pub const EXPORT_FILE: &str = "firewatch_export.json";

/// How long a status message stays visible.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Main application state.
///
/// Holds a copy of the latest [`DashboardView`] pulled from the reconcile
/// loop plus purely presentational state (scroll position, overlays).
pub struct App {
    pub running: bool,
    pub show_help: bool,

    // Derived state
    view_rx: watch::Receiver<DashboardView>,
    pub view: DashboardView,
    pub source_closed: bool,
    pub last_refresh: Option<Instant>,

    // Context
    source_description: String,
    pub device_path: String,
    pub thresholds: Thresholds,

    // Navigation state (index into the history, newest first)
    pub selected_index: usize,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(
        view_rx: watch::Receiver<DashboardView>,
        source_description: &str,
        device_path: &str,
        thresholds: Thresholds,
        theme: Theme,
    ) -> Self {
        let view = view_rx.borrow().clone();
        Self {
            running: true,
            show_help: false,
            view_rx,
            view,
            source_closed: false,
            last_refresh: None,
            source_description: source_description.to_string(),
            device_path: device_path.to_string(),
            thresholds,
            selected_index: 0,
            theme,
            status_message: None,
        }
    }

    /// Returns a description of the current telemetry source.
    pub fn source_description(&self) -> &str {
        &self.source_description
    }

    /// Pull the latest view from the reconcile loop.
    ///
    /// Returns true if the view changed.
    pub fn refresh(&mut self) -> bool {
        let changed = match self.view_rx.has_changed() {
            Ok(changed) => changed,
            Err(_) => {
                if !self.source_closed {
                    self.source_closed = true;
                    self.set_status_message("Telemetry source closed".to_string());
                }
                *self.view_rx.borrow() != self.view
            }
        };
        if !changed {
            return false;
        }

        let view = self.view_rx.borrow_and_update().clone();
        if view.alarm_triggers > self.view.alarm_triggers {
            self.set_status_message("FIRE ALARM: alarm became active".to_string());
        }
        self.view = view;
        self.last_refresh = Some(Instant::now());

        // Clamp selection to the new history length
        let max = self.view.history.len().saturating_sub(1);
        self.selected_index = self.selected_index.min(max);
        true
    }

    /// Overall level of the current snapshot, if any.
    pub fn current_level(&self) -> Option<Level> {
        self.view
            .current
            .as_deref()
            .map(|snapshot| self.thresholds.overall(snapshot))
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < STATUS_TTL => Some(msg),
            _ => None,
        }
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.view.history.len().saturating_sub(1);
        self.selected_index = (self.selected_index + n).min(max);
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_index = self.selected_index.saturating_sub(n);
    }

    /// Jump to the newest entry.
    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    /// Jump to the oldest entry.
    pub fn select_last(&mut self) {
        self.selected_index = self.view.history.len().saturating_sub(1);
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export current state to a file.
    pub fn export_state(&self, path: &Path) -> anyhow::Result<()> {
        write_export(&self.view, &self.device_path, &self.thresholds, path)
    }
}

#[derive(Serialize)]
struct Export<'a> {
    device_path: &'a str,
    exported_at: DateTime<Utc>,
    level: Option<Level>,
    #[serde(flatten)]
    view: &'a DashboardView,
}

/// Write a derived view as pretty-printed JSON.
pub fn write_export(
    view: &DashboardView,
    device_path: &str,
    thresholds: &Thresholds,
    path: &Path,
) -> anyhow::Result<()> {
    let export = Export {
        device_path,
        exported_at: Utc::now(),
        level: view.current.as_deref().map(|s| thresholds.overall(s)),
        view,
    };
    let json = serde_json::to_string_pretty(&export)?;
    std::fs::write(path, json)?;
    Ok(())
}
