//! Optimistic synchronization between user intents and the task store.
//!
//! [`SyncCore`] owns the task collection and the interaction flags. Intents
//! change that state immediately and hand back [`Effect`]s describing the
//! remote work; when the work settles, the matching [`Completion`] is applied
//! and the core either keeps the optimistic change or restores the snapshot
//! taken before it.
//!
//! The core is synchronous and performs no I/O; see [`crate::net`] for the
//! worker that runs effects.

pub mod effect;
pub mod engine;
pub mod speculative;
pub mod state;

pub use effect::{Completion, Effect, OpId};
pub use engine::{SyncCore, SyncOptions};
pub use speculative::Speculation;
pub use state::{EditState, InteractionState, Presence, TaskCollection};

use tasklist_proto::task::{TaskId, TextError};
use thiserror::Error;

/// Shown when a create call fails.
pub const ADD_FAILED: &str = "Failed to add task. Please try again.";
/// Shown when a delete call fails.
pub const DELETE_FAILED: &str = "Failed to delete task. Please try again.";
/// Shown when an update call fails.
pub const UPDATE_FAILED: &str = "Failed to update task. Please try again.";
/// Shown when a list call fails.
pub const FETCH_FAILED: &str = "Failed to fetch tasks. Please try again later.";

/// Reasons an intent is refused before any state changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    /// Text is empty after trimming.
    #[error("task text cannot be empty")]
    BlankText,
    /// Text is longer than allowed after trimming.
    #[error("task text cannot exceed {max} characters")]
    TextTooLong {
        /// Configured limit.
        max: usize,
    },
    /// An add is already in flight.
    #[error("a task is already being added")]
    SubmitInFlight,
    /// Save requested with no edit in progress.
    #[error("no task is being edited")]
    NotEditing,
    /// The task is not in the collection.
    #[error("task {0} not found")]
    UnknownTask(TaskId),
    /// The task is already being removed.
    #[error("task {0} is being removed")]
    TaskExiting(TaskId),
    /// Another change to the task has not settled yet.
    #[error("task {0} has a change in flight")]
    TaskBusy(TaskId),
}

impl From<TextError> for IntentError {
    fn from(err: TextError) -> Self {
        match err {
            TextError::Blank => Self::BlankText,
            TextError::TooLong { max } => Self::TextTooLong { max },
        }
    }
}
