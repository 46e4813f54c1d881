//! Terminal UI rendering.

pub mod input_panel;
pub mod status_bar;
pub mod task_panel;
pub mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use crate::app::App;

/// Main draw function for the entire UI.
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Add-task input
            Constraint::Min(3),    // Task list
            Constraint::Length(1), // Error / notice line
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    input_panel::render(frame, chunks[0], app);
    task_panel::render(frame, chunks[1], app);
    status_bar::render_message(frame, chunks[2], app);
    status_bar::render(frame, chunks[3], app);
}

/// Insert a block cursor at character index `cursor`.
pub(crate) fn with_cursor(text: &str, cursor: usize) -> String {
    let mut out = String::with_capacity(text.len() + 3);
    let mut placed = false;
    for (i, c) in text.chars().enumerate() {
        if i == cursor {
            out.push('█');
            placed = true;
        }
        out.push(c);
    }
    if !placed {
        out.push('█');
    }
    out
}
