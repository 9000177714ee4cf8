//! Common UI components.
//!
//! This module contains the header bar, status bar, and help overlay.

use chrono::Utc;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;

/// Render the header bar.
///
/// Displays: overall level, device path, online badge, fired alarm count.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let (status_icon, status_style) = match app.current_level() {
        Some(level) => ("●", app.theme.level_style(level)),
        None => ("○", Style::default().fg(app.theme.muted)),
    };

    let online = app.view.online;
    let badge = if online { " ONLINE " } else { " OFFLINE " };

    let alarms = app.view.alarm_triggers;
    let alarm_style = if alarms > 0 {
        Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };

    let line = Line::from(vec![
        Span::styled(format!(" {} ", status_icon), status_style),
        Span::styled("FIREWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::raw(app.device_path.clone()),
        Span::raw(" │"),
        Span::styled(badge, app.theme.liveness_style(online)),
        Span::raw("│ "),
        Span::styled(format!("{}", alarms), alarm_style),
        Span::raw(" alarms │ "),
        Span::styled(
            app.source_description().to_string(),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the status bar at the bottom.
///
/// Shows time since the last snapshot and available controls, or a
/// temporary status message.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = "j/k:scroll e:export ?:help q:quit";
    let status = match app.view.current {
        Some(ref current) => {
            let elapsed = (Utc::now() - current.arrival).num_milliseconds().max(0) as f64 / 1000.0;
            format!(" Updated {:.1}s ago | {}", elapsed, controls)
        }
        None if app.source_closed => format!(" Source closed | {}", controls),
        None => format!(" Waiting for data | {}", controls),
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the dashboard.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " History",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  ↑/↓ j/k     Scroll history"),
        Line::from("  PgUp/PgDn   Jump 10 entries"),
        Line::from("  Home/End    Newest/oldest"),
        Line::from("  Wheel       Scroll history"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  e         Export to JSON"),
        Line::from("  ?         Toggle help"),
        Line::from("  q / Esc   Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 40u16.min(area.width.saturating_sub(4));
    let help_height = 18u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
