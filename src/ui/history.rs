//! History table rendering.
//!
//! Lists past snapshots newest first with per-reading colouring and the
//! overall level of each row.

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::telemetry::format::{
    format_alarm, format_flame, format_gas, format_humidity, format_temperature,
    format_timestamp,
};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let history = &app.view.history;
    let thresholds = &app.thresholds;
    let theme = &app.theme;

    let header = Row::new(vec![
        Cell::from("Time"),
        Cell::from("Temp"),
        Cell::from("Humidity"),
        Cell::from("Gas"),
        Cell::from("Flame"),
        Cell::from("Alarm"),
        Cell::from("Status"),
    ])
    .height(1)
    .style(theme.header);

    let rows: Vec<Row> = history
        .iter()
        .map(|s| {
            let level = thresholds.overall(s);
            Row::new(vec![
                Cell::from(format_timestamp(s.timestamp.or(Some(s.arrival)))),
                Cell::from(format_temperature(s.temperature))
                    .style(theme.reading_style(thresholds.temperature_level(s.temperature))),
                Cell::from(format_humidity(s.humidity)),
                Cell::from(format_gas(s.gas))
                    .style(theme.reading_style(thresholds.gas_level(s.gas))),
                Cell::from(format_flame(s.flame))
                    .style(theme.reading_style(thresholds.flame_level(s.flame))),
                Cell::from(format_alarm(s.alarm)).style(theme.alarm_style(s.alarm)),
                Cell::from(level.symbol()).style(theme.level_style(level)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(19), // Time
        Constraint::Fill(1), // Temp
        Constraint::Fill(1), // Humidity
        Constraint::Fill(1), // Gas
        Constraint::Min(5),  // Flame
        Constraint::Min(5),  // Alarm
        Constraint::Min(6),  // Status
    ];

    let selected = app.selected_index.min(history.len().saturating_sub(1));
    let position_info = if !history.is_empty() {
        format!(" [{}/{}]", selected + 1, history.len())
    } else {
        String::new()
    };
    let title = format!(" History ({} entries){} ", history.len(), position_info);

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(theme.border_type)
                .border_style(Style::default().fg(theme.border)),
        )
        .row_highlight_style(theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if !history.is_empty() {
        state.select(Some(selected));
    }

    frame.render_stateful_widget(table, area, &mut state);
}
