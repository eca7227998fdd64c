// src/ui/widgets/domain_table.rs

use crate::app::App;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Row, Table},
};

/// Renders the server-paginated domain table.
///
/// The rows are exactly what the last applied listing response carried; the
/// title shows where the page sits in the filtered result set.
pub fn render_domain_table(frame: &mut Frame, app: &mut App, area: Rect) {
    let title = format!(
        "Domains ({} matching, {} total) - page {}/{}",
        app.records_filtered,
        app.records_total,
        app.page + 1,
        app.page_count()
    );
    let block = Block::default().borders(Borders::ALL).title(title);

    let header = Row::new(vec![
        Cell::from("#"),
        Cell::from("Domain"),
        Cell::from("IP"),
        Cell::from("Title"),
        Cell::from("Banner"),
    ])
    .style(Style::default().bold().fg(Color::Cyan));

    let rows: Vec<Row> = app
        .rows
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.index.to_string()),
                Cell::from(r.domain.clone()).style(Style::default().fg(Color::Green)),
                Cell::from(r.ip.clone()),
                Cell::from(r.title.clone()),
                Cell::from(r.banner.clone()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Percentage(25),
        Constraint::Percentage(20),
        Constraint::Percentage(25),
        Constraint::Percentage(30),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().bg(Color::DarkGray).bold())
        .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut app.table_state);
}
