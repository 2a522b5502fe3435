use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
};
use std::time::Duration;

use super::app::App;

pub fn draw(f: &mut Frame, app: &App) {
    let size = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(vec![
            Constraint::Length(2), // Title
            Constraint::Min(4),    // Track list
            Constraint::Length(3), // Progress bar
            Constraint::Length(2), // Transport status + message
            Constraint::Length(3), // Controls
        ])
        .split(size);

    let title = Paragraph::new("ABX Player")
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    draw_track_list(f, chunks[1], app);
    draw_progress_bar(f, chunks[2], app);
    draw_transport_status(f, chunks[3], app);
    draw_controls(f, chunks[4], app);
}

fn draw_track_list(f: &mut Frame, area: Rect, app: &App) {
    let snapshot = app.session.snapshot();
    let mut lines = Vec::new();

    for (index, track) in app.session.tracks().iter().enumerate() {
        let is_active = snapshot.active_track_id == Some(track.id);
        let is_selected = index == app.selected;

        let (r, g, b) = track.color;
        let mut style = Style::default().fg(Color::Rgb(r, g, b));
        if is_selected {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        if is_active {
            style = style.add_modifier(Modifier::BOLD);
        }

        let indicator = if is_active { "▶" } else { " " };
        let markers = if track.markers.is_empty() {
            String::new()
        } else {
            format!("  ({} markers)", track.markers.len())
        };

        lines.push(Line::from(vec![
            Span::raw(format!("{indicator} {}. ", index + 1)),
            Span::styled(track.name.clone(), style),
            Span::raw(format!("  {}{markers}", format_time(track.duration))),
        ]));
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No tracks loaded",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let list = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Tracks"));
    f.render_widget(list, area);
}

fn draw_progress_bar(f: &mut Frame, area: Rect, app: &App) {
    let snapshot = app.session.snapshot();
    let ratio = if snapshot.duration > Duration::ZERO {
        (snapshot.current_time.as_secs_f64() / snapshot.duration.as_secs_f64()).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let label = format!(
        "{} / {}",
        format_time(snapshot.current_time),
        format_time(snapshot.duration)
    );

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(ratio)
        .label(label);
    f.render_widget(gauge, area);
}

fn draw_transport_status(f: &mut Frame, area: Rect, app: &App) {
    let snapshot = app.session.snapshot();

    let state = if snapshot.is_playing { "playing" } else { "paused" };
    let muted = if snapshot.muted_previous_volume.is_some() {
        "  muted"
    } else {
        ""
    };
    let looped = if snapshot.loop_enabled { "  loop ●" } else { "" };

    let status_line = format!(
        "{state}  vol {:>3.0}%  rate {:.2}x{muted}{looped}",
        snapshot.volume * 100.0,
        snapshot.playback_rate
    );

    let mut lines = vec![Line::from(status_line)];
    if let Some(message) = &app.status {
        lines.push(Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        )));
    }

    let widget = Paragraph::new(lines).alignment(Alignment::Center);
    f.render_widget(widget, area);
}

fn draw_controls(f: &mut Frame, area: Rect, app: &App) {
    let snapshot = app.session.snapshot();

    let controls_row1 = vec![
        if snapshot.is_playing {
            Span::styled("[space]", Style::default().fg(Color::Yellow))
        } else {
            Span::styled("[space]", Style::default().fg(Color::Green))
        },
        Span::raw(if snapshot.is_playing {
            " pause  "
        } else {
            " play  "
        }),
        Span::styled("[1-9]", Style::default().fg(Color::Cyan)),
        Span::raw(" switch  "),
        Span::styled("[n/p]", Style::default().fg(Color::Cyan)),
        Span::raw(" next/prev  "),
        Span::styled("[←→]", Style::default().fg(Color::Magenta)),
        Span::raw(" seek  "),
        Span::styled("[q]", Style::default().fg(Color::Red)),
        Span::raw(" quit"),
    ];

    let controls_row2 = vec![
        Span::styled("[+/-]", Style::default().fg(Color::Green)),
        Span::raw(" volume  "),
        Span::styled("[m]", Style::default().fg(Color::Green)),
        Span::raw(" mute  "),
        if snapshot.loop_enabled {
            Span::styled(
                "[l]",
                Style::default().fg(Color::Magenta).bg(Color::DarkGray),
            )
        } else {
            Span::styled("[l]", Style::default().fg(Color::Magenta))
        },
        Span::raw(" loop  "),
        Span::styled("[</>]", Style::default().fg(Color::Blue)),
        Span::raw(" rate  "),
        Span::styled("[a/x]", Style::default().fg(Color::Cyan)),
        Span::raw(" marker  "),
        Span::styled("[r]", Style::default().fg(Color::Red)),
        Span::raw(" remove"),
    ];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    let border = Block::default().borders(Borders::TOP);
    f.render_widget(border, area);

    f.render_widget(
        Paragraph::new(Line::from(controls_row1)).alignment(Alignment::Center),
        rows[0],
    );
    f.render_widget(
        Paragraph::new(Line::from(controls_row2)).alignment(Alignment::Center),
        rows[1],
    );
}

fn format_time(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(Duration::ZERO), "0:00");
        assert_eq!(format_time(Duration::from_secs(59)), "0:59");
        assert_eq!(format_time(Duration::from_secs(95)), "1:35");
        assert_eq!(format_time(Duration::from_secs(600)), "10:00");
    }
}
