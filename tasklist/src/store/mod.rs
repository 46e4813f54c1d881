//! Remote task store abstraction.
//!
//! Defines the [`TaskStore`] trait the synchronization core's effects are
//! executed against. Implementations:
//! - [`http::HttpTaskStore`]: the HTTP/JSON store served by `tasklist-store`
//! - [`memory::InMemoryTaskStore`]: in-process store with latency and failure
//!   injection, for tests and the `--demo` mode

pub mod http;
pub mod memory;

use std::fmt;

use tasklist_proto::task::{Task, TaskId};

/// Describes which kind of store backs the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Remote HTTP store.
    Http,
    /// In-process store.
    Memory,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "HTTP"),
            Self::Memory => write!(f, "Memory"),
        }
    }
}

/// Errors returned by store calls.
///
/// The synchronization core treats every variant the same way; the
/// distinction only matters for logging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The request never produced a response (connect failure, timeout).
    #[error("request failed: {0}")]
    Transport(String),

    /// The store answered with a non-success status.
    #[error("store responded {status}: {message}")]
    Status {
        /// HTTP-style status code.
        status: u16,
        /// Error text reported by the store.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Convenience constructor for status failures.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }
}

/// Async request/response interface to the task store.
///
/// Every call is independent: implementations must allow several calls to
/// be in flight at once, and must not assume any ordering between them.
pub trait TaskStore: Send + Sync {
    /// Fetch every task, newest first.
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<Task>, StoreError>> + Send;

    /// Create a task with the given text.
    ///
    /// The store assigns the identifier; the caller learns it from a
    /// subsequent [`list`](TaskStore::list).
    fn create(&self, text: &str)
    -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Replace the text of an existing task.
    fn update(
        &self,
        id: TaskId,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Delete an existing task.
    fn delete(&self, id: TaskId)
    -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Return the kind of this store.
    fn kind(&self) -> StoreKind;
}
