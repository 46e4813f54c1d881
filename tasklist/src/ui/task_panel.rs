//! Task list rendering.
//!
//! Exiting tasks stay on screen, dimmed and struck through, until their
//! exit delay elapses. The task under edit shows its draft in place.

use chrono::TimeZone;
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use tasklist_proto::task::Task;

use super::{theme, with_cursor};
use crate::app::{App, PanelFocus};
use crate::sync::{EditState, Presence};

/// Render the task list panel.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let is_focused = app.focus == PanelFocus::List || app.is_editing();
    let interaction = app.core.interaction();

    let title = if interaction.loading {
        format!("Tasks ({}) · loading…", app.core.tasks().len())
    } else {
        format!("Tasks ({})", app.core.tasks().len())
    };

    let block = Block::default()
        .title(Span::styled(title, theme::panel_title(theme::TASKS_TITLE)))
        .borders(Borders::ALL)
        .border_style(if is_focused {
            theme::highlighted()
        } else {
            theme::normal()
        });

    if app.core.tasks().is_empty() {
        let placeholder = if interaction.loading {
            "Loading tasks..."
        } else {
            "No tasks yet. Add one above!"
        };
        let paragraph =
            Paragraph::new(Line::from(Span::styled(placeholder, theme::dimmed()))).block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .core
        .tasks()
        .iter()
        .map(|task| ListItem::new(task_line(app, task)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(if is_focused {
            theme::selected()
        } else {
            theme::normal()
        })
        .highlight_symbol("› ");

    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn task_line<'a>(app: &'a App, task: &'a Task) -> Line<'a> {
    let stamp = format_timestamp(task.created_at, &app.timestamp_format);

    if let EditState::Editing { id, draft } = &app.core.interaction().editing
        && *id == task.id
    {
        return Line::from(vec![
            Span::styled(stamp, theme::timestamp()),
            Span::raw(" "),
            Span::styled(with_cursor(draft, app.draft_cursor), theme::editing()),
        ]);
    }

    let (text_style, marker) = match app.core.presence(task.id) {
        Presence::Exiting => (theme::exiting(), " ✗"),
        _ if app.core.is_busy(task.id) => (theme::normal(), " ⋯"),
        _ => (theme::normal(), ""),
    };

    Line::from(vec![
        Span::styled(stamp, theme::timestamp()),
        Span::raw(" "),
        Span::styled(task.text.as_str(), text_style),
        Span::styled(marker, theme::dimmed()),
    ])
}

/// Formats a millisecond timestamp in local time; zero renders as blanks.
fn format_timestamp(ms: u64, format: &str) -> String {
    let Ok(ms) = i64::try_from(ms) else {
        return String::new();
    };
    if ms == 0 {
        return "     ".to_string();
    }
    chrono::Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|t| t.format(format).to_string())
        .unwrap_or_default()
}
