//! Status bar and message line rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::{App, PanelFocus};

/// Render the status bar at the bottom of the screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let help_text = if app.is_editing() {
        "Enter: save | Esc: cancel | ←→: move cursor"
    } else {
        match app.focus {
            PanelFocus::Input => "Enter: add | Tab: task list | Esc: quit",
            PanelFocus::List => {
                "↑↓/jk: select | e: edit | d: delete | r: refresh | Tab: input | q: quit"
            }
        }
    };

    let in_flight = app.core.in_flight();
    let (dot_color, activity) = if in_flight == 0 {
        (theme::SUCCESS, "idle".to_string())
    } else {
        (theme::WARNING, format!("{in_flight} pending"))
    };

    let status_line = Line::from(vec![
        Span::styled(concat!("Tasklist v", env!("CARGO_PKG_VERSION")), theme::bold()),
        Span::raw(" | "),
        Span::styled("●", theme::normal().fg(dot_color)),
        Span::raw(format!(" {} · {activity}", app.store_label)),
        Span::raw(" | "),
        Span::styled(help_text, theme::dimmed()),
    ]);

    let paragraph = Paragraph::new(status_line).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}

/// Render the surfaced store error, or else the last local notice.
pub fn render_message(frame: &mut Frame, area: Rect, app: &App) {
    let line = if let Some(error) = &app.core.interaction().error {
        Line::from(Span::styled(error.as_str(), theme::error()))
    } else if let Some(notice) = &app.notice {
        Line::from(Span::styled(notice.as_str(), theme::dimmed()))
    } else {
        Line::default()
    };
    frame.render_widget(Paragraph::new(line), area);
}
