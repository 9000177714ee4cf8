//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::telemetry::Level;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for normal readings and the online badge.
    pub normal: Color,
    /// Color for elevated readings.
    pub elevated: Color,
    /// Color for high readings.
    pub high: Color,
    /// Color for critical readings and active alarms.
    pub critical: Color,
    /// Color for the offline badge and unset values.
    pub muted: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for the selected history row.
    pub selected: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            normal: Color::Green,
            elevated: Color::Yellow,
            high: Color::LightRed,
            critical: Color::Red,
            muted: Color::DarkGray,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            normal: Color::Green,
            elevated: Color::Yellow,
            high: Color::Magenta,
            critical: Color::Red,
            muted: Color::Gray,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Get style for a reading level
    pub fn level_style(&self, level: Level) -> Style {
        match level {
            Level::Normal => Style::default().fg(self.normal),
            Level::Elevated => Style::default().fg(self.elevated),
            Level::High => Style::default().fg(self.high).add_modifier(Modifier::BOLD),
            Level::Critical => Style::default().fg(self.critical).add_modifier(Modifier::BOLD),
        }
    }

    /// Style for a reading that may be unset.
    pub fn reading_style(&self, level: Option<Level>) -> Style {
        match level {
            Some(level) => self.level_style(level),
            None => Style::default().fg(self.muted),
        }
    }

    /// Style for the online/offline badge.
    pub fn liveness_style(&self, online: bool) -> Style {
        if online {
            Style::default().fg(self.normal).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.muted).add_modifier(Modifier::BOLD)
        }
    }

    /// Style for the alarm flag.
    pub fn alarm_style(&self, alarm: bool) -> Style {
        if alarm {
            Style::default()
                .fg(self.critical)
                .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK)
        } else {
            Style::default().fg(self.normal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_reading_is_muted() {
        let theme = Theme::dark();
        assert_eq!(theme.reading_style(None).fg, Some(theme.muted));
        assert_eq!(
            theme.reading_style(Some(Level::Critical)).fg,
            Some(theme.critical)
        );
    }

    #[test]
    fn test_liveness_colors_differ() {
        let theme = Theme::light();
        assert_ne!(theme.liveness_style(true), theme.liveness_style(false));
    }
}
