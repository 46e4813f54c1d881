//! Integration tests for optimistic synchronization against a live store.
//!
//! Drives [`SyncCore`] through the effect worker against an
//! [`InMemoryTaskStore`] with injected latency and failures, on a paused
//! tokio clock so exit timers and store calls race deterministically.
//!
//! These tests validate:
//! - Add round-trip: trimmed create, cleared input, collection from listing
//! - Blank input issues no store call
//! - Delete: exiting mark, timed removal, idempotent timers
//! - Delete rollback wins over the exit timer in both orders
//! - Edit: optimistic text, immediate exit from edit mode, rollback on failure
//! - Single edit target
//! - Overlapping add and delete converge on the store's state
//! - A confirmed delete or edit survives a listing the store answered first

use std::sync::Arc;
use std::time::Duration;

use tasklist::net::{self, NetCommand};
use tasklist::store::memory::{Call, InMemoryTaskStore, Operation};
use tasklist::sync::{
    Completion, DELETE_FAILED, Effect, EditState, IntentError, Presence, SyncCore, SyncOptions,
    UPDATE_FAILED,
};
use tasklist_proto::task::{Task, TaskId};
use tokio::sync::mpsc;
use tokio::time::Instant;

const EXIT_DELAY: Duration = Duration::from_millis(300);

/// Core + worker + store, applying completions the way the TUI loop does.
struct Harness {
    core: SyncCore,
    store: Arc<InMemoryTaskStore>,
    tx: mpsc::Sender<NetCommand>,
    rx: mpsc::Receiver<Completion>,
}

impl Harness {
    fn new(tasks: Vec<Task>) -> Self {
        let store = Arc::new(InMemoryTaskStore::with_tasks(tasks));
        let core = SyncCore::with_tasks(
            store.tasks(),
            SyncOptions {
                exit_delay: EXIT_DELAY,
                ..SyncOptions::default()
            },
        );
        let (tx, rx) = net::spawn_worker(Arc::clone(&store), 64);
        Self {
            core,
            store,
            tx,
            rx,
        }
    }

    fn run(&self, effects: Vec<Effect>) {
        let undelivered = net::dispatch(&self.tx, effects);
        assert!(undelivered.is_empty(), "worker rejected effects");
    }

    /// Wait for the next completion, apply it, and dispatch follow-ups.
    async fn settle(&mut self) -> Completion {
        let completion = tokio::time::timeout(Duration::from_secs(30), self.rx.recv())
            .await
            .expect("timeout waiting for completion")
            .expect("worker channel closed");
        let follow = self.core.apply(completion.clone());
        self.run(follow);
        completion
    }

    fn texts(&self) -> Vec<String> {
        self.core.tasks().iter().map(|t| t.text.clone()).collect()
    }

    fn text_of(&self, id: i64) -> Option<String> {
        self.core.tasks().get(TaskId::new(id)).map(|t| t.text.clone())
    }
}

fn task(id: i64, text: &str) -> Task {
    Task::new(TaskId::new(id), text, u64::try_from(id).unwrap())
}

fn three_tasks() -> Vec<Task> {
    vec![task(7, "seven"), task(5, "five"), task(3, "three")]
}

// =============================================================================
// Add
// =============================================================================

#[tokio::test(start_paused = true)]
async fn add_round_trip_trims_clears_and_refreshes() {
    let mut h = Harness::new(vec![task(1, "existing")]);

    h.core.set_input("  buy milk  ");
    let effect = h.core.submit_add().unwrap();
    h.run(vec![effect]);

    let created = h.settle().await;
    assert!(matches!(created, Completion::Created { result: Ok(()), .. }));
    assert!(h.core.interaction().input.is_empty());
    assert!(!h.core.interaction().submitting);
    assert!(h.core.interaction().loading);

    let listed = h.settle().await;
    assert!(matches!(listed, Completion::Listed { result: Ok(_), .. }));
    assert_eq!(h.texts(), vec!["buy milk", "existing"]);
    assert!(!h.core.interaction().loading);

    assert_eq!(
        h.store.calls(),
        vec![Call::Create("buy milk".to_string()), Call::List]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_add_keeps_input_and_skips_refresh() {
    let mut h = Harness::new(Vec::new());
    h.store.set_failing(Operation::Create, true);

    h.core.set_input("buy milk");
    let effect = h.core.submit_add().unwrap();
    h.run(vec![effect]);
    h.settle().await;

    assert_eq!(h.core.interaction().input, "buy milk");
    assert!(!h.core.interaction().submitting);
    assert!(h.core.interaction().error.is_some());
    assert_eq!(h.store.call_count(Operation::List), 0);
}

#[tokio::test(start_paused = true)]
async fn blank_input_issues_no_call() {
    let h = Harness::new(three_tasks());
    let before = h.core.tasks().clone();
    let mut core = h.core;

    core.set_input("   ");
    assert_eq!(core.submit_add(), Err(IntentError::BlankText));
    assert_eq!(core.tasks(), &before);
    assert!(h.store.calls().is_empty());
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test(start_paused = true)]
async fn delete_removes_after_exit_delay() {
    let mut h = Harness::new(three_tasks());
    h.store
        .set_latency(Operation::Delete, Duration::from_millis(50));
    let id = TaskId::new(5);

    let start = Instant::now();
    let effects = h.core.delete(id).unwrap();
    h.run(effects);
    assert_eq!(h.core.presence(id), Presence::Exiting);

    let deleted = h.settle().await;
    assert!(matches!(deleted, Completion::Deleted { result: Ok(()), .. }));
    assert_eq!(h.core.presence(id), Presence::Exiting);

    let elapsed = h.settle().await;
    assert!(matches!(elapsed, Completion::ExitElapsed { .. }));
    assert!(start.elapsed() >= EXIT_DELAY);
    assert_eq!(h.core.presence(id), Presence::Removed);
    assert_eq!(h.texts(), vec!["seven", "three"]);
    assert!(h.store.tasks().iter().all(|t| t.id != id));
}

#[tokio::test(start_paused = true)]
async fn duplicate_removal_leaves_collection_unchanged() {
    let mut h = Harness::new(three_tasks());
    let id = TaskId::new(5);
    let effects = h.core.delete(id).unwrap();
    let timer = effects[1].clone();
    h.run(effects);

    h.settle().await;
    h.settle().await;
    let after_first = h.core.tasks().clone();

    // Fire the same timer a second time.
    h.run(vec![timer]);
    h.settle().await;
    assert_eq!(h.core.tasks(), &after_first);
}

#[tokio::test(start_paused = true)]
async fn delete_failure_before_delay_wins() {
    let mut h = Harness::new(three_tasks());
    h.store
        .set_latency(Operation::Delete, Duration::from_millis(100));
    h.store.set_failing(Operation::Delete, true);
    let before = h.core.tasks().clone();
    let id = TaskId::new(5);

    let effects = h.core.delete(id).unwrap();
    h.run(effects);

    let first = h.settle().await;
    assert!(matches!(first, Completion::Deleted { result: Err(_), .. }));
    assert_eq!(h.core.presence(id), Presence::Active);
    assert_eq!(
        h.core.interaction().error.as_deref(),
        Some(DELETE_FAILED)
    );

    let second = h.settle().await;
    assert!(matches!(second, Completion::ExitElapsed { .. }));
    assert_eq!(h.core.tasks(), &before);
    assert_eq!(h.text_of(5).as_deref(), Some("five"));
    assert_eq!(h.core.presence(id), Presence::Active);
}

#[tokio::test(start_paused = true)]
async fn delete_failure_after_removal_restores() {
    let mut h = Harness::new(three_tasks());
    h.store.set_latency(Operation::Delete, Duration::from_secs(1));
    h.store.set_failing(Operation::Delete, true);
    let before = h.core.tasks().clone();
    let id = TaskId::new(3);

    let effects = h.core.delete(id).unwrap();
    h.run(effects);

    let first = h.settle().await;
    assert!(matches!(first, Completion::ExitElapsed { .. }));
    assert_eq!(h.core.presence(id), Presence::Removed);

    let second = h.settle().await;
    assert!(matches!(second, Completion::Deleted { result: Err(_), .. }));
    assert_eq!(h.core.tasks(), &before);
    assert_eq!(h.core.presence(id), Presence::Active);
}

// =============================================================================
// Edit
// =============================================================================

#[tokio::test(start_paused = true)]
async fn edit_failure_rolls_back_after_leaving_edit_mode() {
    let mut h = Harness::new(vec![task(2, "A")]);
    h.store
        .set_latency(Operation::Update, Duration::from_millis(100));
    h.store.set_failing(Operation::Update, true);

    h.core.start_edit(TaskId::new(2)).unwrap();
    *h.core.draft_mut().unwrap() = "B".to_string();
    let effect = h.core.save_edit().unwrap();
    h.run(vec![effect]);

    assert_eq!(h.text_of(2).as_deref(), Some("B"));
    assert_eq!(h.core.interaction().editing, EditState::Idle);

    h.settle().await;
    assert_eq!(h.text_of(2).as_deref(), Some("A"));
    assert_eq!(
        h.core.interaction().error.as_deref(),
        Some(UPDATE_FAILED)
    );
    assert_eq!(h.store.tasks()[0].text, "A");
}

#[tokio::test(start_paused = true)]
async fn edit_success_keeps_optimistic_text() {
    let mut h = Harness::new(vec![task(2, "A")]);

    h.core.start_edit(TaskId::new(2)).unwrap();
    *h.core.draft_mut().unwrap() = "  B  ".to_string();
    let effect = h.core.save_edit().unwrap();
    h.run(vec![effect]);
    h.settle().await;

    assert_eq!(h.text_of(2).as_deref(), Some("B"));
    assert!(h.core.interaction().error.is_none());
    assert_eq!(
        h.store.calls(),
        vec![Call::Update(TaskId::new(2), "B".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn switching_edit_target_discards_draft() {
    let mut h = Harness::new(vec![task(3, "three"), task(1, "one")]);

    h.core.start_edit(TaskId::new(1)).unwrap();
    *h.core.draft_mut().unwrap() = "one, edited".to_string();
    h.core.start_edit(TaskId::new(3)).unwrap();

    assert_eq!(
        h.core.interaction().editing,
        EditState::Editing {
            id: TaskId::new(3),
            draft: "three".to_string()
        }
    );
    assert_eq!(h.text_of(1).as_deref(), Some("one"));
    assert!(h.store.calls().is_empty());
}

// =============================================================================
// Overlapping operations
// =============================================================================

#[tokio::test(start_paused = true)]
async fn overlapping_add_and_delete_converge() {
    let mut h = Harness::new(vec![task(1, "a")]);
    h.store
        .set_latency(Operation::Delete, Duration::from_millis(400));
    h.store
        .set_latency(Operation::Create, Duration::from_millis(100));
    h.store.set_latency(Operation::List, Duration::from_millis(50));

    let effects = h.core.delete(TaskId::new(1)).unwrap();
    h.run(effects);
    h.core.set_input("b");
    let effect = h.core.submit_add().unwrap();
    h.run(vec![effect]);

    // Created (100ms) -> Listed (150ms): the listing still contains "a",
    // which keeps its exiting mark.
    h.settle().await;
    h.settle().await;
    assert_eq!(h.texts(), vec!["b", "a"]);
    assert_eq!(h.core.presence(TaskId::new(1)), Presence::Exiting);

    // ExitElapsed (300ms) -> Deleted (400ms).
    h.settle().await;
    h.settle().await;
    assert_eq!(h.texts(), vec!["b"]);
    assert_eq!(h.core.in_flight(), 0);
    let store_texts: Vec<String> = h.store.tasks().into_iter().map(|t| t.text).collect();
    assert_eq!(store_texts, vec!["b"]);
}

#[tokio::test(start_paused = true)]
async fn delete_confirmed_after_stale_listing_stays_removed() {
    let mut h = Harness::new(vec![task(1, "a")]);
    h.store
        .set_latency(Operation::Delete, Duration::from_millis(600));
    h.store
        .set_latency(Operation::Create, Duration::from_millis(200));
    h.store
        .set_latency(Operation::List, Duration::from_millis(150));

    let effects = h.core.delete(TaskId::new(1)).unwrap();
    h.run(effects);
    h.core.set_input("b");
    let effect = h.core.submit_add().unwrap();
    h.run(vec![effect]);

    // Created (200ms) -> ExitElapsed (300ms).
    h.settle().await;
    h.settle().await;
    assert_eq!(h.texts(), vec!["b"]);

    // Listed (350ms) was answered before the store processed the delete.
    let listed = h.settle().await;
    assert!(matches!(listed, Completion::Listed { result: Ok(_), .. }));
    assert_eq!(h.texts(), vec!["b", "a"]);
    assert_eq!(h.core.presence(TaskId::new(1)), Presence::Active);

    // Deleted (600ms).
    let deleted = h.settle().await;
    assert!(matches!(deleted, Completion::Deleted { result: Ok(()), .. }));
    assert_eq!(h.texts(), vec!["b"]);
    assert_eq!(h.core.presence(TaskId::new(1)), Presence::Removed);
    let store_texts: Vec<String> = h.store.tasks().into_iter().map(|t| t.text).collect();
    assert_eq!(store_texts, vec!["b"]);
}

#[tokio::test(start_paused = true)]
async fn edit_confirmed_after_stale_listing_keeps_new_text() {
    let mut h = Harness::new(vec![task(1, "a")]);
    h.store
        .set_latency(Operation::Update, Duration::from_millis(400));
    h.store
        .set_latency(Operation::Create, Duration::from_millis(100));
    h.store.set_latency(Operation::List, Duration::from_millis(50));

    h.core.start_edit(TaskId::new(1)).unwrap();
    *h.core.draft_mut().unwrap() = "a, edited".to_string();
    let effect = h.core.save_edit().unwrap();
    h.run(vec![effect]);
    h.core.set_input("b");
    let effect = h.core.submit_add().unwrap();
    h.run(vec![effect]);

    // Created (100ms) -> Listed (150ms) still carries the old text.
    h.settle().await;
    h.settle().await;
    assert_eq!(h.text_of(1).as_deref(), Some("a"));

    // Updated (400ms).
    let updated = h.settle().await;
    assert!(matches!(updated, Completion::Updated { result: Ok(()), .. }));
    assert_eq!(h.texts(), vec!["b", "a, edited"]);
    assert_eq!(h.store.tasks()[1].text, "a, edited");
}

#[tokio::test(start_paused = true)]
async fn editing_task_deleted_elsewhere_returns_to_idle_on_refresh() {
    let mut h = Harness::new(vec![task(1, "a"), task(2, "b")]);
    h.core.start_edit(TaskId::new(2)).unwrap();

    // Removed behind the client's back.
    tasklist::store::TaskStore::delete(h.store.as_ref(), TaskId::new(2))
        .await
        .unwrap();

    let effect = h.core.refresh();
    h.run(vec![effect]);
    h.settle().await;

    assert_eq!(h.core.interaction().editing, EditState::Idle);
    assert_eq!(h.texts(), vec!["a"]);
}
