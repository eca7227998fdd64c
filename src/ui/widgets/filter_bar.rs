// src/ui/widgets/filter_bar.rs

use crate::app::{App, FilterField, Mode};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

/// Renders the filter bar: organization, IP, domain and free-text search.
///
/// The field currently being edited is highlighted; committed values stay
/// visible so the operator can always see which constraints the rendered
/// page reflects.
pub fn render_filter_bar(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Filters");

    let fields = [
        (FilterField::Org, "org", &app.filter_org),
        (FilterField::Ip, "ip", &app.filter_ip),
        (FilterField::Domain, "domain", &app.filter_domain),
        (FilterField::Search, "search", &app.filter_search),
    ];

    let mut spans: Vec<Span> = Vec::new();
    for (field, label, value) in fields {
        let active = app.mode == Mode::Filter(field);
        let style = if active {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!("{}: ", label), style));
        let shown = if active {
            format!("{}_", value)
        } else if value.is_empty() {
            "-".to_string()
        } else {
            value.to_string()
        };
        spans.push(Span::styled(shown, style));
        spans.push(Span::raw("   "));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}
