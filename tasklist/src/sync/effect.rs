//! Effects requested by the synchronization core and their completions.
//!
//! The core never performs I/O. Each intent returns zero or more [`Effect`]s
//! for the worker to run; each effect eventually comes back as exactly one
//! [`Completion`] carrying the same [`OpId`].

use std::fmt;
use std::time::Duration;

use tasklist_proto::task::{Task, TaskId};

use crate::store::StoreError;

/// Identifies one operation from intent to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpId(u64);

impl OpId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// Work the core asks the worker to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the whole collection.
    List {
        /// Operation tag.
        op: OpId,
    },
    /// Create a task with already-trimmed text.
    Create {
        /// Operation tag.
        op: OpId,
        /// Text to store.
        text: String,
    },
    /// Replace a task's text.
    Update {
        /// Operation tag.
        op: OpId,
        /// Task to change.
        id: TaskId,
        /// Replacement text.
        text: String,
    },
    /// Delete a task remotely.
    Delete {
        /// Operation tag.
        op: OpId,
        /// Task to delete.
        id: TaskId,
    },
    /// Wait out the exit animation, then report back.
    ExpireExit {
        /// The delete operation that scheduled the removal.
        op: OpId,
        /// Task to remove.
        id: TaskId,
        /// Animation length.
        after: Duration,
    },
}

impl Effect {
    /// The operation this effect belongs to.
    #[must_use]
    pub const fn op(&self) -> OpId {
        match self {
            Self::List { op }
            | Self::Create { op, .. }
            | Self::Update { op, .. }
            | Self::Delete { op, .. }
            | Self::ExpireExit { op, .. } => *op,
        }
    }

    /// The completion to apply when the effect could not be handed to a
    /// worker at all.
    ///
    /// Store calls fail with a transport error; an exit timer elapses
    /// immediately so the task is not left exiting forever.
    #[must_use]
    pub fn undeliverable(self) -> Completion {
        let err = || StoreError::Transport("effect worker unavailable".to_string());
        match self {
            Self::List { op } => Completion::Listed {
                op,
                result: Err(err()),
            },
            Self::Create { op, .. } => Completion::Created {
                op,
                result: Err(err()),
            },
            Self::Update { op, .. } => Completion::Updated {
                op,
                result: Err(err()),
            },
            Self::Delete { op, .. } => Completion::Deleted {
                op,
                result: Err(err()),
            },
            Self::ExpireExit { op, id, .. } => Completion::ExitElapsed { op, id },
        }
    }
}

/// Outcome of an [`Effect`], fed back into the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// A list call settled.
    Listed {
        /// Operation tag.
        op: OpId,
        /// Listing, newest first.
        result: Result<Vec<Task>, StoreError>,
    },
    /// A create call settled.
    Created {
        /// Operation tag.
        op: OpId,
        /// Outcome.
        result: Result<(), StoreError>,
    },
    /// An update call settled.
    Updated {
        /// Operation tag.
        op: OpId,
        /// Outcome.
        result: Result<(), StoreError>,
    },
    /// A delete call settled.
    Deleted {
        /// Operation tag.
        op: OpId,
        /// Outcome.
        result: Result<(), StoreError>,
    },
    /// An exit animation finished.
    ExitElapsed {
        /// The delete operation that scheduled it.
        op: OpId,
        /// Task to remove.
        id: TaskId,
    },
}

impl Completion {
    /// The operation this completion belongs to.
    #[must_use]
    pub const fn op(&self) -> OpId {
        match self {
            Self::Listed { op, .. }
            | Self::Created { op, .. }
            | Self::Updated { op, .. }
            | Self::Deleted { op, .. }
            | Self::ExitElapsed { op, .. } => *op,
        }
    }
}
