//! In-memory task table with optional JSON file persistence.
//!
//! The [`TaskTable`] keeps tasks newest-first and hands out monotonically
//! increasing identifiers. When a data file is configured, every mutation is
//! written to disk (temp file + rename) before it becomes visible; a failed
//! write leaves the table unchanged. File I/O runs on tokio's blocking pool;
//! the write lock stays held across it so mutations reach disk in order.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tasklist_proto::task::{Task, TaskId};
use tokio::sync::RwLock;

/// Errors returned by table operations.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// No task with the given identifier exists.
    #[error("task {0} not found")]
    NotFound(TaskId),
    /// The data file could not be read or written.
    #[error("failed to persist tasks to {path}: {source}")]
    Persist {
        /// Data file that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The data file exists but does not contain a valid table.
    #[error("corrupt data file {path}: {source}")]
    Corrupt {
        /// Data file that was read.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },
}

/// Serialized form of the table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    next_id: i64,
    /// Newest first.
    tasks: Vec<Task>,
}

impl Snapshot {
    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }
}

/// Task table shared by all request handlers.
pub struct TaskTable {
    state: RwLock<Snapshot>,
    data_file: Option<PathBuf>,
}

impl Default for TaskTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskTable {
    /// Creates an empty, memory-only table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(Snapshot {
                next_id: 1,
                tasks: Vec::new(),
            }),
            data_file: None,
        }
    }

    /// Opens a table persisted at `path`, starting empty if the file does
    /// not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Persist`] if the file exists but cannot be read,
    /// or [`TableError::Corrupt`] if its contents cannot be parsed.
    pub fn open(path: &Path) -> Result<Self, TableError> {
        let snapshot = match std::fs::read_to_string(path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| TableError::Corrupt {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot {
                next_id: 1,
                tasks: Vec::new(),
            },
            Err(source) => {
                return Err(TableError::Persist {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        tracing::info!(path = %path.display(), tasks = snapshot.tasks.len(), "task table loaded");
        Ok(Self {
            state: RwLock::new(snapshot),
            data_file: Some(path.to_path_buf()),
        })
    }

    /// Returns all tasks, newest first.
    pub async fn list(&self) -> Vec<Task> {
        self.state.read().await.tasks.clone()
    }

    /// Inserts a task with already-validated text and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Persist`] if the data file cannot be written.
    pub async fn create(&self, text: &str) -> Result<Task, TableError> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let task = Task::new(TaskId::new(next.next_id), text, now_ms());
        next.next_id += 1;
        next.tasks.insert(0, task.clone());
        self.persist(&next).await?;
        *state = next;
        drop(state);
        Ok(task)
    }

    /// Replaces the text of an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::NotFound`] if the task does not exist, or
    /// [`TableError::Persist`] if the data file cannot be written.
    pub async fn update(&self, id: TaskId, text: &str) -> Result<(), TableError> {
        let mut state = self.state.write().await;
        let idx = state.position(id).ok_or(TableError::NotFound(id))?;
        let mut next = state.clone();
        next.tasks[idx].text = text.to_string();
        self.persist(&next).await?;
        *state = next;
        Ok(())
    }

    /// Deletes an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::NotFound`] if the task does not exist, or
    /// [`TableError::Persist`] if the data file cannot be written.
    pub async fn delete(&self, id: TaskId) -> Result<(), TableError> {
        let mut state = self.state.write().await;
        let idx = state.position(id).ok_or(TableError::NotFound(id))?;
        let mut next = state.clone();
        next.tasks.remove(idx);
        self.persist(&next).await?;
        *state = next;
        Ok(())
    }

    /// Writes `snapshot` to the data file, if one is configured.
    async fn persist(&self, snapshot: &Snapshot) -> Result<(), TableError> {
        let Some(path) = &self.data_file else {
            return Ok(());
        };
        let io_err = |source| TableError::Persist {
            path: path.clone(),
            source,
        };
        let data = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| io_err(std::io::Error::other(e)))?;
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&target, &data))
            .await
            .map_err(|e| io_err(std::io::Error::other(e)))?
            .map_err(io_err)
    }
}

/// Writes `data` next to `path` and renames it into place.
fn write_atomically(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)
}

/// Returns the current timestamp in milliseconds since epoch.
fn now_ms() -> u64 {
    u64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis(),
    )
    .unwrap_or(u64::MAX)
}
