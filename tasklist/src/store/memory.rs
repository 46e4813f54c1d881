//! In-process task store for testing and offline demos.
//!
//! Applies the same validation and status codes as the HTTP store, and adds
//! two knobs the real store lacks: a per-operation artificial latency and a
//! per-operation failure switch. Every call is recorded so tests can assert
//! exactly what was sent.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use parking_lot::Mutex;
use tasklist_proto::task::{MAX_TASK_TEXT_LENGTH, Task, TaskId, TextError, normalize_text};

use super::{StoreError, StoreKind, TaskStore};

/// Store operation, used to target latency and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `list`
    List,
    /// `create`
    Create,
    /// `update`
    Update,
    /// `delete`
    Delete,
}

/// A call received by the store, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `list()`
    List,
    /// `create(text)`
    Create(String),
    /// `update(id, text)`
    Update(TaskId, String),
    /// `delete(id)`
    Delete(TaskId),
}

impl Call {
    const fn operation(&self) -> Operation {
        match self {
            Self::List => Operation::List,
            Self::Create(_) => Operation::Create,
            Self::Update(..) => Operation::Update,
            Self::Delete(_) => Operation::Delete,
        }
    }
}

#[derive(Debug, Default)]
struct Table {
    /// Newest first.
    tasks: Vec<Task>,
    next_id: i64,
    clock: u64,
}

/// In-memory [`TaskStore`] backed by a mutex-guarded table.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    table: Mutex<Table>,
    calls: Mutex<Vec<Call>>,
    latency: Mutex<HashMap<Operation, Duration>>,
    failing: Mutex<HashSet<Operation>>,
}

impl InMemoryTaskStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tasks(Vec::new())
    }

    /// Create a store holding `tasks` (newest first).
    ///
    /// Newly created tasks get identifiers above the highest seeded one.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let next_id = tasks.iter().map(|t| t.id.get()).max().unwrap_or(0) + 1;
        let clock = tasks.iter().map(|t| t.created_at).max().unwrap_or(0);
        Self {
            table: Mutex::new(Table {
                tasks,
                next_id,
                clock,
            }),
            ..Self::default()
        }
    }

    /// A small seeded store for the `--demo` mode.
    #[must_use]
    pub fn demo() -> Self {
        let store = Self::with_tasks(Vec::new());
        for text in ["Water the plants", "Book dentist appointment", "Buy milk"] {
            store.insert(text);
        }
        store.set_latency(Operation::List, Duration::from_millis(150));
        store.set_latency(Operation::Create, Duration::from_millis(250));
        store.set_latency(Operation::Update, Duration::from_millis(250));
        store.set_latency(Operation::Delete, Duration::from_millis(400));
        store
    }

    /// Delay every future call of `op` by `delay` before it takes effect.
    pub fn set_latency(&self, op: Operation, delay: Duration) {
        self.latency.lock().insert(op, delay);
    }

    /// Make every future call of `op` fail with a `500` (or succeed again).
    pub fn set_failing(&self, op: Operation, failing: bool) {
        let mut set = self.failing.lock();
        if failing {
            set.insert(op);
        } else {
            set.remove(&op);
        }
    }

    /// Returns the current table contents, newest first.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.table.lock().tasks.clone()
    }

    /// Returns every call received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Returns how many calls of `op` were received.
    #[must_use]
    pub fn call_count(&self, op: Operation) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.operation() == op)
            .count()
    }

    fn insert(&self, text: &str) -> Task {
        let mut table = self.table.lock();
        table.clock += 1;
        let task = Task::new(TaskId::new(table.next_id), text, table.clock);
        table.next_id += 1;
        table.tasks.insert(0, task.clone());
        task
    }

    /// Records the call, waits out the configured latency, then checks the
    /// failure switch.
    async fn begin(&self, call: Call) -> Result<(), StoreError> {
        let op = call.operation();
        tracing::trace!(?call, "memory store call");
        self.calls.lock().push(call);

        let delay = self.latency.lock().get(&op).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().contains(&op) {
            return Err(StoreError::status(500, format!("injected {op:?} failure")));
        }
        Ok(())
    }
}

fn validate(text: &str) -> Result<&str, StoreError> {
    normalize_text(text, MAX_TASK_TEXT_LENGTH).map_err(|e| match e {
        TextError::Blank => StoreError::status(400, "Task text is required and cannot be empty."),
        TextError::TooLong { max } => {
            StoreError::status(400, format!("Task text cannot exceed {max} characters."))
        }
    })
}

fn not_found() -> StoreError {
    StoreError::status(404, "Task not found.")
}

impl TaskStore for InMemoryTaskStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        self.begin(Call::List).await?;
        Ok(self.tasks())
    }

    async fn create(&self, text: &str) -> Result<(), StoreError> {
        self.begin(Call::Create(text.to_string())).await?;
        let text = validate(text)?;
        self.insert(text);
        Ok(())
    }

    async fn update(&self, id: TaskId, text: &str) -> Result<(), StoreError> {
        self.begin(Call::Update(id, text.to_string())).await?;
        let text = validate(text)?;
        let mut table = self.table.lock();
        let task = table
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(not_found)?;
        task.text = text.to_string();
        drop(table);
        Ok(())
    }

    async fn delete(&self, id: TaskId) -> Result<(), StoreError> {
        self.begin(Call::Delete(id)).await?;
        let mut table = self.table.lock();
        let idx = table
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(not_found)?;
        table.tasks.remove(idx);
        drop(table);
        Ok(())
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Memory
    }
}
