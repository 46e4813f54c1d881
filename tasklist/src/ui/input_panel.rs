//! Add-task input box.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::{theme, with_cursor};
use crate::app::{App, PanelFocus};

/// Render the add-task input box.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let interaction = app.core.interaction();
    let is_focused = app.focus == PanelFocus::Input && !app.is_editing();

    let input_line = if interaction.submitting {
        Line::from(vec![
            Span::styled(interaction.input.as_str(), theme::dimmed()),
            Span::styled("  adding…", theme::pending()),
        ])
    } else if interaction.input.is_empty() && !is_focused {
        Line::from(Span::styled("Add a new task...", theme::dimmed()))
    } else if is_focused {
        Line::from(Span::styled(
            with_cursor(&interaction.input, app.input_cursor),
            theme::normal(),
        ))
    } else {
        Line::from(Span::styled(interaction.input.as_str(), theme::normal()))
    };

    let block = Block::default()
        .title(Span::styled("New task", theme::panel_title(theme::INPUT_TITLE)))
        .borders(Borders::ALL)
        .border_style(if is_focused {
            theme::highlighted()
        } else {
            theme::normal()
        });

    let paragraph = Paragraph::new(input_line).block(block);

    frame.render_widget(paragraph, area);
}
