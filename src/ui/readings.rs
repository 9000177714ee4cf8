//! Current readings panel.
//!
//! One card per reading, coloured by its level. When the device has no
//! current snapshot the panel shows a "No data" placeholder instead.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::telemetry::assess::flame_note;
use crate::telemetry::format::{
    format_alarm, format_flame, format_gas, format_humidity, format_temperature,
    format_timestamp,
};
use crate::telemetry::Snapshot;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Current readings ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let Some(snapshot) = app.view.current.as_deref() else {
        let text = vec![
            Line::from(Span::styled(
                "No data",
                Style::default().fg(app.theme.muted).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("Waiting for {}", app.device_path),
                Style::default().add_modifier(Modifier::DIM),
            )),
        ];
        let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::vertical([Constraint::Min(4), Constraint::Length(1)]).split(inner);
    let cards = Layout::horizontal([Constraint::Fill(1); 5]).split(rows[0]);

    let thresholds = &app.thresholds;
    render_card(
        frame,
        app,
        cards[0],
        "Temperature",
        format_temperature(snapshot.temperature),
        app.theme.reading_style(thresholds.temperature_level(snapshot.temperature)),
        thresholds.temperature_note(snapshot.temperature),
    );
    render_card(
        frame,
        app,
        cards[1],
        "Humidity",
        format_humidity(snapshot.humidity),
        Style::default().fg(app.theme.highlight),
        if snapshot.humidity.is_some() {
            "Relative humidity"
        } else {
            "Waiting for data..."
        },
    );
    render_card(
        frame,
        app,
        cards[2],
        "Gas",
        format_gas(snapshot.gas),
        app.theme.reading_style(thresholds.gas_level(snapshot.gas)),
        thresholds.gas_note(snapshot.gas),
    );
    render_card(
        frame,
        app,
        cards[3],
        "Flame",
        format_flame(snapshot.flame),
        app.theme.reading_style(thresholds.flame_level(snapshot.flame)),
        flame_note(snapshot.flame),
    );
    render_card(
        frame,
        app,
        cards[4],
        "Alarm",
        format_alarm(snapshot.alarm).to_string(),
        app.theme.alarm_style(snapshot.alarm),
        if snapshot.alarm {
            "Alarm is active!"
        } else {
            "No active alarm."
        },
    );

    frame.render_widget(Paragraph::new(meta_line(snapshot)), rows[1]);
}

fn render_card(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    title: &str,
    value: String,
    value_style: Style,
    note: &str,
) {
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let text = vec![
        Line::from(Span::styled(value, value_style.add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(
            note.to_string(),
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(paragraph, area);
}

fn meta_line(snapshot: &Snapshot) -> Line<'static> {
    Line::from(vec![
        Span::raw(" Reading time: "),
        Span::styled(
            format_timestamp(snapshot.timestamp),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("   Received: "),
        Span::raw(format_timestamp(Some(snapshot.arrival))),
    ])
}
