// src/ui/layout.rs

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Defines the areas of the dashboard's user interface.
///
/// Each `Rect` is one widget area on the terminal screen, computed once per
/// frame so the widgets never re-derive dimensions themselves.
pub struct AppLayout {
    pub filter: Rect,
    pub table: Rect,
    pub status: Rect,
    pub footer: Rect,
}

/// Splits the frame into the filter bar, the domain table, the status panel
/// and the one-line footer.
pub fn create_layout(frame_size: Rect) -> AppLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(frame_size);

    AppLayout {
        filter: chunks[0],
        table: chunks[1],
        status: chunks[2],
        footer: chunks[3],
    }
}
