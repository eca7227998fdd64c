// src/ui/widgets/status_bar.rs

use crate::app::App;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

/// Renders the status panel: the polled aggregate task summary plus the most
/// recent notice.
///
/// The summary is whatever the last successful poll returned; a failing poll
/// leaves it untouched, so a stale line is expected while the server is
/// unreachable.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Tasks");

    let mut lines = vec![Line::from(vec![
        Span::styled("status: ", Style::default().bold()),
        Span::styled(app.task_info.clone(), Style::default().fg(Color::Cyan)),
    ])];

    if let Some(notice) = &app.notice {
        lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Yellow),
        )));
    } else if app.list_in_flight {
        lines.push(Line::from(Span::styled(
            "loading...",
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
