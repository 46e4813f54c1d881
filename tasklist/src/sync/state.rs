//! Client-side task collection and interaction state.

use tasklist_proto::task::{Task, TaskId};

/// Ordered snapshot of tasks, unique by id.
///
/// Order is whatever the store returned (newest first); the collection never
/// re-sorts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskCollection {
    tasks: Vec<Task>,
}

impl TaskCollection {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Builds a collection from a store listing.
    ///
    /// If the listing repeats an id, the first occurrence wins.
    #[must_use]
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut seen = std::collections::HashSet::with_capacity(tasks.len());
        let tasks = tasks.into_iter().filter(|t| seen.insert(t.id)).collect();
        Self { tasks }
    }

    /// Iterates tasks in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    /// Returns the tasks as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Looks up a task by id.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Whether a task with `id` is present.
    #[must_use]
    pub fn contains(&self, id: TaskId) -> bool {
        self.get(id).is_some()
    }

    /// Replaces the text of task `id`. Returns `false` if it is absent.
    pub fn set_text(&mut self, id: TaskId, text: &str) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.text = text.to_string();
                true
            }
            None => false,
        }
    }

    /// Removes task `id`. Removing an absent id is a no-op returning `None`.
    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(idx))
    }

    /// Replaces the whole collection with a fresh listing.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        *self = Self::from_tasks(tasks);
    }
}

impl<'a> IntoIterator for &'a TaskCollection {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

/// Visibility of a task from the presentation layer's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Present and interactive.
    Active,
    /// Marked for removal and animating out.
    Exiting,
    /// Not in the collection.
    Removed,
}

/// Edit mode: at most one task is edited at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    /// No task is being edited.
    #[default]
    Idle,
    /// Task `id` is being edited with the given draft text.
    Editing {
        /// Task under edit.
        id: TaskId,
        /// Unsaved replacement text.
        draft: String,
    },
}

impl EditState {
    /// The task under edit, if any.
    #[must_use]
    pub const fn editing_id(&self) -> Option<TaskId> {
        match self {
            Self::Idle => None,
            Self::Editing { id, .. } => Some(*id),
        }
    }
}

/// Transient UI flags, owned by the synchronization core.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionState {
    /// Add-task input text.
    pub input: String,
    /// An add request is in flight.
    pub submitting: bool,
    /// A list request is in flight.
    pub loading: bool,
    /// Current edit mode.
    pub editing: EditState,
    /// Last surfaced user-facing error.
    pub error: Option<String>,
}
