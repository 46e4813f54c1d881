//! The synchronization state machine.

use std::collections::HashMap;
use std::time::Duration;

use tasklist_proto::task::{MAX_TASK_TEXT_LENGTH, Task, TaskId, normalize_text};

use super::effect::{Completion, Effect, OpId};
use super::speculative::Speculation;
use super::state::{EditState, InteractionState, Presence, TaskCollection};
use super::{ADD_FAILED, DELETE_FAILED, FETCH_FAILED, IntentError, UPDATE_FAILED};
use crate::store::StoreError;

/// Default length of the exit animation.
pub const DEFAULT_EXIT_DELAY: Duration = Duration::from_millis(300);

/// Tunables for [`SyncCore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// How long a deleted task stays visible as exiting.
    pub exit_delay: Duration,
    /// Maximum task text length in characters, after trimming.
    pub max_text_len: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            exit_delay: DEFAULT_EXIT_DELAY,
            max_text_len: MAX_TASK_TEXT_LENGTH,
        }
    }
}

/// An operation awaiting its completion.
#[derive(Debug)]
enum Pending {
    List,
    Create,
    Update {
        id: TaskId,
        text: String,
        rollback: Speculation<TaskCollection>,
    },
    Delete {
        id: TaskId,
        rollback: Speculation<TaskCollection>,
    },
}

impl Pending {
    const fn task(&self) -> Option<TaskId> {
        match self {
            Self::List | Self::Create => None,
            Self::Update { id, .. } | Self::Delete { id, .. } => Some(*id),
        }
    }
}

/// Optimistic synchronization core.
///
/// All methods run on the caller's thread and return immediately. Intents
/// that need the store return [`Effect`]s; feed each effect's outcome back
/// through [`apply`](Self::apply).
#[derive(Debug)]
pub struct SyncCore {
    tasks: TaskCollection,
    interaction: InteractionState,
    /// Exiting task -> the delete operation that marked it.
    exiting: HashMap<TaskId, OpId>,
    pending: HashMap<OpId, Pending>,
    /// Only this list operation may replace the collection.
    latest_list: Option<OpId>,
    next_op: u64,
    options: SyncOptions,
}

impl Default for SyncCore {
    fn default() -> Self {
        Self::new(SyncOptions::default())
    }
}

impl SyncCore {
    /// Creates a core with an empty collection.
    #[must_use]
    pub fn new(options: SyncOptions) -> Self {
        Self::with_tasks(Vec::new(), options)
    }

    /// Creates a core seeded with a confirmed listing.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>, options: SyncOptions) -> Self {
        Self {
            tasks: TaskCollection::from_tasks(tasks),
            interaction: InteractionState::default(),
            exiting: HashMap::new(),
            pending: HashMap::new(),
            latest_list: None,
            next_op: 1,
            options,
        }
    }

    /// The current (possibly speculative) collection.
    #[must_use]
    pub const fn tasks(&self) -> &TaskCollection {
        &self.tasks
    }

    /// The current interaction flags.
    #[must_use]
    pub const fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    /// The options this core was built with.
    #[must_use]
    pub const fn options(&self) -> SyncOptions {
        self.options
    }

    /// Presence of task `id`.
    #[must_use]
    pub fn presence(&self, id: TaskId) -> Presence {
        if !self.tasks.contains(id) {
            Presence::Removed
        } else if self.exiting.contains_key(&id) {
            Presence::Exiting
        } else {
            Presence::Active
        }
    }

    /// Whether task `id` has an update or delete in flight.
    #[must_use]
    pub fn is_busy(&self, id: TaskId) -> bool {
        self.pending.values().any(|p| p.task() == Some(id))
    }

    /// Number of operations awaiting completion.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Mutable access to the add-task input.
    pub fn input_mut(&mut self) -> &mut String {
        &mut self.interaction.input
    }

    /// Replaces the add-task input.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.interaction.input = text.into();
    }

    /// Mutable access to the draft of the task under edit.
    pub fn draft_mut(&mut self) -> Option<&mut String> {
        match &mut self.interaction.editing {
            EditState::Idle => None,
            EditState::Editing { draft, .. } => Some(draft),
        }
    }

    /// Clears the surfaced error.
    pub fn dismiss_error(&mut self) {
        self.interaction.error = None;
    }

    fn next_op(&mut self) -> OpId {
        let op = OpId::new(self.next_op);
        self.next_op += 1;
        op
    }

    fn surface(&mut self, message: &str, err: &StoreError, op: OpId) {
        tracing::warn!(%op, error = %err, "{message}");
        self.interaction.error = Some(message.to_string());
    }

    // -----------------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------------

    /// Fetches the whole collection.
    ///
    /// Any list issued earlier that has not settled yet will be discarded
    /// when it does.
    pub fn refresh(&mut self) -> Effect {
        let op = self.next_op();
        self.pending.insert(op, Pending::List);
        self.latest_list = Some(op);
        self.interaction.loading = true;
        self.interaction.error = None;
        tracing::debug!(%op, "refresh");
        Effect::List { op }
    }

    /// Submits the add-task input.
    ///
    /// # Errors
    ///
    /// [`IntentError::SubmitInFlight`] while another add is pending,
    /// [`IntentError::BlankText`] or [`IntentError::TextTooLong`] if the
    /// trimmed input is invalid. No state changes on error.
    pub fn submit_add(&mut self) -> Result<Effect, IntentError> {
        if self.interaction.submitting {
            return Err(IntentError::SubmitInFlight);
        }
        let text = normalize_text(&self.interaction.input, self.options.max_text_len)?.to_string();

        let op = self.next_op();
        self.pending.insert(op, Pending::Create);
        self.interaction.submitting = true;
        self.interaction.error = None;
        tracing::debug!(%op, len = text.len(), "submit add");
        Ok(Effect::Create { op, text })
    }

    /// Deletes task `id`: marks it exiting now, removes it after the exit
    /// delay, and deletes it remotely.
    ///
    /// If `id` is the task under edit, the edit is cancelled.
    ///
    /// # Errors
    ///
    /// [`IntentError::UnknownTask`], [`IntentError::TaskExiting`] if it is
    /// already being removed, or [`IntentError::TaskBusy`] if an update to
    /// it is still in flight.
    pub fn delete(&mut self, id: TaskId) -> Result<Vec<Effect>, IntentError> {
        if !self.tasks.contains(id) {
            return Err(IntentError::UnknownTask(id));
        }
        if self.exiting.contains_key(&id) {
            return Err(IntentError::TaskExiting(id));
        }
        if self.is_busy(id) {
            return Err(IntentError::TaskBusy(id));
        }

        let op = self.next_op();
        let rollback = Speculation::capture(&self.tasks);
        self.exiting.insert(id, op);
        if self.interaction.editing.editing_id() == Some(id) {
            self.interaction.editing = EditState::Idle;
        }
        self.pending.insert(op, Pending::Delete { id, rollback });
        tracing::debug!(%op, %id, "delete");

        Ok(vec![
            Effect::Delete { op, id },
            Effect::ExpireExit {
                op,
                id,
                after: self.options.exit_delay,
            },
        ])
    }

    /// Enters edit mode for task `id` with its current text as the draft.
    ///
    /// Any draft for another task is discarded.
    ///
    /// # Errors
    ///
    /// [`IntentError::UnknownTask`] or [`IntentError::TaskExiting`].
    pub fn start_edit(&mut self, id: TaskId) -> Result<(), IntentError> {
        let task = self.tasks.get(id).ok_or(IntentError::UnknownTask(id))?;
        if self.exiting.contains_key(&id) {
            return Err(IntentError::TaskExiting(id));
        }
        self.interaction.editing = EditState::Editing {
            id,
            draft: task.text.clone(),
        };
        Ok(())
    }

    /// Leaves edit mode, discarding the draft.
    pub fn cancel_edit(&mut self) {
        self.interaction.editing = EditState::Idle;
    }

    /// Saves the draft: applies it now, leaves edit mode, and updates the
    /// task remotely.
    ///
    /// # Errors
    ///
    /// [`IntentError::NotEditing`], [`IntentError::BlankText`],
    /// [`IntentError::TextTooLong`], [`IntentError::UnknownTask`],
    /// [`IntentError::TaskExiting`], or [`IntentError::TaskBusy`]. No state
    /// changes on error; edit mode is kept.
    pub fn save_edit(&mut self) -> Result<Effect, IntentError> {
        let EditState::Editing { id, draft } = &self.interaction.editing else {
            return Err(IntentError::NotEditing);
        };
        let id = *id;
        let text = normalize_text(draft, self.options.max_text_len)?.to_string();
        if !self.tasks.contains(id) {
            return Err(IntentError::UnknownTask(id));
        }
        if self.exiting.contains_key(&id) {
            return Err(IntentError::TaskExiting(id));
        }
        if self.is_busy(id) {
            return Err(IntentError::TaskBusy(id));
        }

        let op = self.next_op();
        let (rollback, _) = Speculation::apply(&mut self.tasks, |tasks| tasks.set_text(id, &text));
        self.interaction.editing = EditState::Idle;
        self.pending.insert(
            op,
            Pending::Update {
                id,
                text: text.clone(),
                rollback,
            },
        );
        tracing::debug!(%op, %id, "save edit");
        Ok(Effect::Update { op, id, text })
    }

    // -----------------------------------------------------------------------
    // Completions
    // -----------------------------------------------------------------------

    /// Reconciles a settled effect. Returns follow-up effects, if any.
    ///
    /// Completions for unknown or already-settled operations are ignored.
    pub fn apply(&mut self, completion: Completion) -> Vec<Effect> {
        match completion {
            Completion::Listed { op, result } => {
                self.on_listed(op, result);
                Vec::new()
            }
            Completion::Created { op, result } => self.on_created(op, result),
            Completion::Updated { op, result } => {
                self.on_updated(op, result);
                Vec::new()
            }
            Completion::Deleted { op, result } => {
                self.on_deleted(op, result);
                Vec::new()
            }
            Completion::ExitElapsed { op, id } => {
                self.on_exit_elapsed(op, id);
                Vec::new()
            }
        }
    }

    fn on_listed(&mut self, op: OpId, result: Result<Vec<Task>, StoreError>) {
        if !matches!(self.pending.remove(&op), Some(Pending::List)) {
            return;
        }
        if self.latest_list != Some(op) {
            tracing::debug!(%op, "discarding superseded listing");
            return;
        }
        self.latest_list = None;
        self.interaction.loading = false;

        match result {
            Ok(tasks) => {
                tracing::debug!(%op, count = tasks.len(), "listing applied");
                self.tasks.replace_all(tasks);
                let orphaned = self
                    .interaction
                    .editing
                    .editing_id()
                    .is_some_and(|id| !self.tasks.contains(id));
                if orphaned {
                    self.interaction.editing = EditState::Idle;
                }
            }
            Err(err) => self.surface(FETCH_FAILED, &err, op),
        }
    }

    fn on_created(&mut self, op: OpId, result: Result<(), StoreError>) -> Vec<Effect> {
        if !matches!(self.pending.remove(&op), Some(Pending::Create)) {
            return Vec::new();
        }
        self.interaction.submitting = false;
        match result {
            Ok(()) => {
                self.interaction.input.clear();
                vec![self.refresh()]
            }
            Err(err) => {
                self.surface(ADD_FAILED, &err, op);
                Vec::new()
            }
        }
    }

    fn on_updated(&mut self, op: OpId, result: Result<(), StoreError>) {
        let Some(Pending::Update { id, text, rollback }) = self.pending.remove(&op) else {
            return;
        };
        match result {
            Ok(()) => {
                rollback.commit();
                // A listing answered before the store applied the update
                // may have put the old text back.
                self.tasks.set_text(id, &text);
            }
            Err(err) => {
                tracing::debug!(%op, %id, "rolling back update");
                rollback.roll_back(&mut self.tasks);
                self.surface(UPDATE_FAILED, &err, op);
            }
        }
    }

    fn on_deleted(&mut self, op: OpId, result: Result<(), StoreError>) {
        let Some(Pending::Delete { id, rollback }) = self.pending.remove(&op) else {
            return;
        };
        match result {
            Ok(()) => {
                rollback.commit();
                // While still exiting, the timer finishes the removal.
                // Otherwise a listing older than the delete may have
                // restored the task.
                if self.exiting.get(&id) != Some(&op) && self.tasks.remove(id).is_some() {
                    tracing::debug!(%op, %id, "dropping task restored by stale listing");
                }
            }
            Err(err) => {
                tracing::debug!(%op, %id, "rolling back delete");
                if self.exiting.get(&id) == Some(&op) {
                    self.exiting.remove(&id);
                }
                rollback.roll_back(&mut self.tasks);
                self.surface(DELETE_FAILED, &err, op);
            }
        }
    }

    fn on_exit_elapsed(&mut self, op: OpId, id: TaskId) {
        if self.exiting.get(&id) != Some(&op) {
            tracing::trace!(%op, %id, "stale exit timer");
            return;
        }
        self.exiting.remove(&id);
        self.tasks.remove(id);
        tracing::debug!(%op, %id, "exit complete");
    }
}
