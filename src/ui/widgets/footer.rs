// src/ui/widgets/footer.rs

use crate::app::{App, Mode};
use ratatui::{
    prelude::*,
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
};

fn hint(key: &str, action: &str) -> Vec<Span<'static>> {
    vec![
        Span::styled(format!("[{}]", key), Style::new().bold().fg(Color::Yellow)),
        Span::raw(format!(" {}  ", action)),
    ]
}

/// Renders the footer widget, which displays the actions of the active mode.
pub fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let spans: Vec<Span> = match app.mode {
        Mode::Browse => [
            hint("N", "new task"),
            hint("F", "filters"),
            hint("D", "delete"),
            hint("R", "refresh"),
            hint("←/→", "page"),
            hint("Q", "quit"),
        ]
        .concat(),
        Mode::Filter(_) => [
            hint("Tab", "next field"),
            hint("Enter", "search"),
            hint("Esc", "back"),
        ]
        .concat(),
        Mode::TaskForm => [
            hint("Tab", "next section"),
            hint("1-6", "toggle scanners"),
            hint("Enter", "start task"),
            hint("Esc", "cancel"),
        ]
        .concat(),
    };

    let footer = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    frame.render_widget(footer, area);
}
