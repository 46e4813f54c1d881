//! Task record and text validation shared by the client and the store.
//!
//! Both sides apply the same rule to task text: it is trimmed, must not be
//! empty afterwards, and must not exceed [`MAX_TASK_TEXT_LENGTH`] characters.

use serde::{Deserialize, Serialize};

/// Maximum allowed task text length in characters, after trimming.
pub const MAX_TASK_TEXT_LENGTH: usize = 255;

/// Store-assigned task identifier.
///
/// Opaque to the client: it is never generated locally, only read back
/// from a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    /// Wraps a raw identifier value.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single task as stored and listed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned identifier, immutable after creation.
    pub id: TaskId,
    /// Trimmed, non-empty task text.
    pub text: String,
    /// Creation time in milliseconds since epoch (assigned by the store).
    #[serde(default)]
    pub created_at: u64,
}

impl Task {
    /// Creates a task record.
    pub fn new(id: TaskId, text: impl Into<String>, created_at: u64) -> Self {
        Self {
            id,
            text: text.into(),
            created_at,
        }
    }
}

/// Reasons task text is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// Text is empty after trimming.
    #[error("task text is required and cannot be empty")]
    Blank,
    /// Text exceeds the maximum length after trimming.
    #[error("task text cannot exceed {max} characters")]
    TooLong {
        /// The limit that was exceeded.
        max: usize,
    },
}

/// Trims `raw` and checks it against the blank and length rules.
///
/// Returns the trimmed text on success.
///
/// # Errors
///
/// Returns [`TextError::Blank`] if nothing remains after trimming, or
/// [`TextError::TooLong`] if more than `max` characters remain.
pub fn normalize_text(raw: &str, max: usize) -> Result<&str, TextError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TextError::Blank);
    }
    if trimmed.chars().count() > max {
        return Err(TextError::TooLong { max });
    }
    Ok(trimmed)
}
