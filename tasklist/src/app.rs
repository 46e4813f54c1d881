//! Application state and event handling.
//!
//! [`App`] wraps the [`SyncCore`] with the purely presentational state
//! (focus, selection, cursors) and translates key presses into intents.
//! Every handler returns the effects the core produced; the caller hands
//! them to the effect worker.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tasklist_proto::task::TaskId;

use crate::sync::{Completion, Effect, IntentError, SyncCore};

/// Which panel is currently focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    /// Add-task input box (default).
    Input,
    /// Task list.
    List,
}

/// Main application state.
pub struct App {
    /// Synchronization core holding tasks and interaction flags.
    pub core: SyncCore,
    /// Which panel is focused.
    pub focus: PanelFocus,
    /// Selected row in the task list.
    pub selected: usize,
    /// Cursor position in the add-task input (character index).
    pub input_cursor: usize,
    /// Cursor position in the edit draft (character index).
    pub draft_cursor: usize,
    /// Local hint for a refused intent (e.g. "task 3 is being removed").
    pub notice: Option<String>,
    /// Short description of the backing store for the status bar.
    pub store_label: String,
    /// Timestamp display format (chrono).
    pub timestamp_format: String,
    /// Whether the app should quit.
    pub should_quit: bool,
}

impl App {
    /// Create an application around `core`.
    #[must_use]
    pub fn new(core: SyncCore, store_label: impl Into<String>) -> Self {
        Self {
            core,
            focus: PanelFocus::Input,
            selected: 0,
            input_cursor: 0,
            draft_cursor: 0,
            notice: None,
            store_label: store_label.into(),
            timestamp_format: "%H:%M".to_string(),
            should_quit: false,
        }
    }

    /// Set the timestamp format used by the task list.
    #[must_use]
    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    /// Effects to run at startup: the initial load.
    pub fn start(&mut self) -> Vec<Effect> {
        vec![self.core.refresh()]
    }

    /// The id of the selected task, if the list is non-empty.
    #[must_use]
    pub fn selected_task(&self) -> Option<TaskId> {
        self.core.tasks().as_slice().get(self.selected).map(|t| t.id)
    }

    /// Whether a task is being edited.
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        matches!(
            self.core.interaction().editing,
            crate::sync::EditState::Editing { .. }
        )
    }

    /// Apply a settled effect and return any follow-up effects.
    pub fn apply_completion(&mut self, completion: Completion) -> Vec<Effect> {
        let follow = self.core.apply(completion);
        self.clamp_selection();
        if self.input_cursor > char_len(&self.core.interaction().input) {
            self.input_cursor = char_len(&self.core.interaction().input);
        }
        follow
    }

    /// Handle a key event.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Vec<Effect> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Vec::new();
        }

        if self.is_editing() {
            return self.handle_edit_key(key);
        }

        if matches!(key.code, KeyCode::Tab | KeyCode::BackTab) {
            self.toggle_focus();
            return Vec::new();
        }

        match self.focus {
            PanelFocus::Input => self.handle_input_key(key),
            PanelFocus::List => self.handle_list_key(key),
        }
    }

    /// Handle key event when the add-task input is focused.
    fn handle_input_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => return self.submit(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                // The input is locked while an add is in flight.
                if !self.core.interaction().submitting {
                    self.notice = None;
                    insert_char(self.core.input_mut(), &mut self.input_cursor, c);
                }
            }
            KeyCode::Backspace if !self.core.interaction().submitting => {
                remove_char_before(self.core.input_mut(), &mut self.input_cursor);
            }
            KeyCode::Left => self.input_cursor = self.input_cursor.saturating_sub(1),
            KeyCode::Right => {
                self.input_cursor = (self.input_cursor + 1).min(char_len(&self.core.interaction().input));
            }
            KeyCode::Home => self.input_cursor = 0,
            KeyCode::End => self.input_cursor = char_len(&self.core.interaction().input),
            _ => {}
        }
        Vec::new()
    }

    /// Handle key event when the task list is focused.
    fn handle_list_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1).min(self.core.tasks().len().saturating_sub(1));
            }
            KeyCode::Char('a' | 'i') => self.focus = PanelFocus::Input,
            KeyCode::Enter | KeyCode::Char('e') => self.start_edit(),
            KeyCode::Delete | KeyCode::Char('d') => return self.delete_selected(),
            KeyCode::Char('r') => {
                self.notice = None;
                return vec![self.core.refresh()];
            }
            _ => {}
        }
        Vec::new()
    }

    /// Handle key event while a task is being edited.
    fn handle_edit_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Esc => self.core.cancel_edit(),
            KeyCode::Enter => match self.core.save_edit() {
                Ok(effect) => return vec![effect],
                Err(err) => self.refuse(&err),
            },
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(draft) = self.core.draft_mut() {
                    insert_char(draft, &mut self.draft_cursor, c);
                }
            }
            KeyCode::Backspace => {
                if let Some(draft) = self.core.draft_mut() {
                    remove_char_before(draft, &mut self.draft_cursor);
                }
            }
            KeyCode::Left => self.draft_cursor = self.draft_cursor.saturating_sub(1),
            KeyCode::Right => {
                let len = self.core.draft_mut().map_or(0, |d| char_len(d));
                self.draft_cursor = (self.draft_cursor + 1).min(len);
            }
            KeyCode::Home => self.draft_cursor = 0,
            KeyCode::End => self.draft_cursor = self.core.draft_mut().map_or(0, |d| char_len(d)),
            _ => {}
        }
        Vec::new()
    }

    fn submit(&mut self) -> Vec<Effect> {
        match self.core.submit_add() {
            Ok(effect) => {
                self.notice = None;
                vec![effect]
            }
            Err(err) => {
                self.refuse(&err);
                Vec::new()
            }
        }
    }

    fn start_edit(&mut self) {
        let Some(id) = self.selected_task() else {
            return;
        };
        match self.core.start_edit(id) {
            Ok(()) => {
                self.notice = None;
                self.draft_cursor = self.core.draft_mut().map_or(0, |d| char_len(d));
            }
            Err(err) => self.refuse(&err),
        }
    }

    fn delete_selected(&mut self) -> Vec<Effect> {
        let Some(id) = self.selected_task() else {
            return Vec::new();
        };
        match self.core.delete(id) {
            Ok(effects) => {
                self.notice = None;
                effects
            }
            Err(err) => {
                self.refuse(&err);
                Vec::new()
            }
        }
    }

    /// Record a refused intent. Blank text is refused silently.
    fn refuse(&mut self, err: &IntentError) {
        tracing::debug!(error = %err, "intent refused");
        if *err != IntentError::BlankText {
            self.notice = Some(err.to_string());
        }
    }

    const fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            PanelFocus::Input => PanelFocus::List,
            PanelFocus::List => PanelFocus::Input,
        };
    }

    fn clamp_selection(&mut self) {
        let len = self.core.tasks().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of character index `idx` (or the end of `s`).
fn byte_offset(s: &str, idx: usize) -> usize {
    s.char_indices().nth(idx).map_or(s.len(), |(i, _)| i)
}

fn insert_char(s: &mut String, cursor: &mut usize, c: char) {
    *cursor = (*cursor).min(char_len(s));
    s.insert(byte_offset(s, *cursor), c);
    *cursor += 1;
}

fn remove_char_before(s: &mut String, cursor: &mut usize) {
    *cursor = (*cursor).min(char_len(s));
    if *cursor > 0 {
        s.remove(byte_offset(s, *cursor - 1));
        *cursor -= 1;
    }
}
