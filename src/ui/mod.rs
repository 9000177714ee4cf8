//! Terminal UI rendering using ratatui.
//!
//! ## Submodules
//!
//! - [`readings`]: Cards for the current snapshot, or a "No data" placeholder
//! - [`history`]: Table of past snapshots, newest first
//! - [`common`]: Shared components (header, status bar, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Current readings (readings::render)  │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ History (history::render)            │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Help overlay rendered on top
//! ```

pub mod common;
pub mod history;
pub mod readings;
pub mod theme;

pub use theme::Theme;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    widgets::Paragraph,
    Frame,
};

use crate::app::App;

/// Minimum terminal size for usable display.
pub const MIN_WIDTH: u16 = 60;
pub const MIN_HEIGHT: u16 = 16;

/// Render one full frame.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(app.theme.elevated));
        let centered = Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5)
            .intersection(area);
        frame.render_widget(paragraph, centered);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1), // Header bar
        Constraint::Length(9), // Current readings
        Constraint::Min(5),    // History
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    common::render_header(frame, app, chunks[0]);
    readings::render(frame, app, chunks[1]);
    history::render(frame, app, chunks[2]);
    common::render_status_bar(frame, app, chunks[3]);

    if app.show_help {
        common::render_help(frame, app, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::DashboardView;
    use crate::telemetry::{Snapshot, Thresholds, TimestampUnit};
    use chrono::Utc;
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::watch;

    fn draw(view: DashboardView) -> String {
        let (_tx, rx) = watch::channel(view);
        let app = App::new(rx, "test", "/devices/esp32_1", Thresholds::default(), Theme::dark());

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();

        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_no_data_renders_offline_placeholder() {
        let screen = draw(DashboardView::default());
        assert!(screen.contains("No data"));
        assert!(screen.contains("OFFLINE"));
        assert!(screen.contains("History (0 entries)"));
    }

    #[test]
    fn test_current_snapshot_renders_readings() {
        let snapshot = Arc::new(Snapshot::from_value(
            &json!({"temperature": 47.5, "gas": 2500, "flame": 1, "alarm": true}),
            Utc::now(),
            TimestampUnit::Millis,
        ));
        let screen = draw(DashboardView {
            current: Some(snapshot.clone()),
            history: vec![snapshot],
            online: true,
            alarm_triggers: 1,
        });

        assert!(screen.contains("ONLINE"));
        assert!(screen.contains("47.5 °C"));
        assert!(screen.contains("2500"));
        // Humidity was missing and must not render as zero
        assert!(screen.contains("-- %"));
        assert!(screen.contains("History (1 entries)"));
    }

    #[test]
    fn test_small_terminal_shows_resize_hint() {
        let (_tx, rx) = watch::channel(DashboardView::default());
        let app = App::new(rx, "test", "/devices/esp32_1", Thresholds::default(), Theme::dark());
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(screen.contains("Terminal too small"));
    }
}
