// src/ui/widgets/task_form.rs

use crate::app::{App, TaskField};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

/// Renders the new-task form on top of the existing UI.
///
/// The `Clear` widget is essential here: it wipes the popup area before
/// rendering, so the table underneath never bleeds through.
pub fn render_task_form(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title("New Scan Task")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let popup_area = centered_rect(70, 60, area);

    let field_style = |field: Option<TaskField>| {
        if app.task_form.field == field {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default()
        }
    };
    let flag = |on: bool| if on { "[x]" } else { "[ ]" };

    let options = app.task_form.options;
    let lines = vec![
        Line::from(vec![
            Span::styled("Targets: ", field_style(Some(TaskField::Target))),
            Span::raw(app.task_form.target.clone()),
        ]),
        Line::from(Span::styled(
            "  (space or comma separated domains / addresses)",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Org id: ", field_style(Some(TaskField::Org))),
            Span::raw(app.task_form.org.clone()),
        ]),
        Line::from(""),
        Line::from(Span::styled("Scanners:", field_style(None))),
        Line::from(format!("  1 {} subdomain enumeration", flag(options.subdomain))),
        Line::from(format!("  2 {} web title", flag(options.webtitle))),
        Line::from(format!("  3 {} technology fingerprint", flag(options.whatweb))),
        Line::from(format!("  4 {} port scan", flag(options.portscan))),
        Line::from(format!("  5 {} FOFA search", flag(options.fofasearch))),
        Line::from(format!("  6 {} network scan", flag(options.networkscan))),
    ];

    let popup = Paragraph::new(lines).block(block);
    frame.render_widget(Clear, popup_area);
    frame.render_widget(popup, popup_area);
}

/// Helper function to create a centered rectangle for a popup.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
