// src/ui/mod.rs

use crate::app::{App, Mode};
use ratatui::prelude::*;

mod layout;
mod widgets;

pub fn render(app: &mut App, frame: &mut Frame) {
    let layout = layout::create_layout(frame.area());

    widgets::filter_bar::render_filter_bar(frame, app, layout.filter);
    widgets::domain_table::render_domain_table(frame, app, layout.table);
    widgets::status_bar::render_status_bar(frame, app, layout.status);
    widgets::footer::render_footer(frame, app, layout.footer);

    // The task form is a modal drawn over everything else.
    if app.mode == Mode::TaskForm {
        widgets::task_form::render_task_form(frame, app, frame.area());
    }
}
