//! HTTP/JSON contract between the task list client and the store.
//!
//! Every operation is a single request/response exchange. Successful
//! responses carry either a [`TaskList`] or a [`MessageBody`]; failures
//! carry an [`ErrorBody`] with a non-success status.

use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskId};

/// Route for listing all tasks (`GET`).
pub const LIST_PATH: &str = "/api/getTasks";

/// Route for creating a task (`POST`).
pub const CREATE_PATH: &str = "/api/addTask";

/// Route for changing a task's text (`PUT`).
pub const UPDATE_PATH: &str = "/api/updateTask";

/// Route for deleting a task (`DELETE`).
pub const DELETE_PATH: &str = "/api/deleteTask";

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    /// Text of the new task.
    pub text: String,
}

/// Body of an update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    /// Task to change.
    pub id: TaskId,
    /// Replacement text.
    pub text: String,
}

/// Body of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTaskRequest {
    /// Task to delete.
    pub id: TaskId,
}

/// Successful list response, newest task first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    /// Tasks in descending creation order.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Successful mutation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    /// Human-readable confirmation.
    pub message: String,
}

impl MessageBody {
    /// Creates a confirmation body.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short description of what failed.
    pub error: String,
    /// Underlying cause, present for store-side failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    /// Creates a failure body without details.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Error type for decoding response bodies.
#[derive(Debug, thiserror::Error)]
#[error("malformed response body: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// Decodes a list response body.
///
/// # Errors
///
/// Returns [`DecodeError`] if the bytes are not a valid [`TaskList`].
pub fn decode_task_list(bytes: &[u8]) -> Result<TaskList, DecodeError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decodes a failure body.
///
/// # Errors
///
/// Returns [`DecodeError`] if the bytes are not a valid [`ErrorBody`].
pub fn decode_error_body(bytes: &[u8]) -> Result<ErrorBody, DecodeError> {
    Ok(serde_json::from_slice(bytes)?)
}
