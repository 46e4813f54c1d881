//! Integration tests for the HTTP task store client against the reference
//! store server running in-process.
//!
//! These tests validate:
//! - `HttpTaskStore` CRUD round-trips through `tasklist-store`
//! - Non-success statuses surface as `StoreError::Status` with the store's
//!   error text
//! - A stopped server surfaces as a transport error
//! - The full optimistic flow (add, edit, delete) through the worker

use std::sync::Arc;
use std::time::Duration;

use tasklist::net;
use tasklist::store::http::HttpTaskStore;
use tasklist::store::{StoreError, TaskStore};
use tasklist::sync::{Completion, Presence, SyncCore, SyncOptions};
use tasklist_proto::task::TaskId;

/// Start the store server in-process and return a client for it.
async fn start_store() -> (HttpTaskStore, tokio::task::JoinHandle<()>) {
    let (addr, handle) = tasklist_store::server::start_server("127.0.0.1:0")
        .await
        .expect("failed to start store server");
    let store = HttpTaskStore::new(&format!("http://{addr}/"), Duration::from_secs(5));
    (store, handle)
}

fn texts(tasks: &[tasklist_proto::task::Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.text.as_str()).collect()
}

// =============================================================================
// Store client
// =============================================================================

#[tokio::test]
async fn crud_round_trip() {
    let (store, _handle) = start_store().await;

    assert!(store.list().await.unwrap().is_empty());

    store.create("  first ").await.unwrap();
    store.create("second").await.unwrap();
    let tasks = store.list().await.unwrap();
    assert_eq!(texts(&tasks), vec!["second", "first"]);
    assert!(tasks.iter().all(|t| t.created_at > 0));

    let first = tasks[1].id;
    store.update(first, "first, edited").await.unwrap();
    store.delete(tasks[0].id).await.unwrap();

    let tasks = store.list().await.unwrap();
    assert_eq!(texts(&tasks), vec!["first, edited"]);
    assert_eq!(tasks[0].id, first);
}

#[tokio::test]
async fn rejected_requests_carry_store_message() {
    let (store, _handle) = start_store().await;

    let err = store.create("   ").await.unwrap_err();
    assert_eq!(
        err,
        StoreError::status(400, "Task text is required and cannot be empty.")
    );

    let err = store.create(&"x".repeat(256)).await.unwrap_err();
    assert_eq!(
        err,
        StoreError::status(400, "Task text cannot exceed 255 characters.")
    );

    let err = store.update(TaskId::new(404), "x").await.unwrap_err();
    assert_eq!(err, StoreError::status(404, "Task not found."));

    let err = store.delete(TaskId::new(404)).await.unwrap_err();
    assert_eq!(err, StoreError::status(404, "Task not found."));
}

#[tokio::test]
async fn stopped_server_is_transport_error() {
    let (store, handle) = start_store().await;
    handle.abort();
    let _ = handle.await;

    let err = store.list().await.unwrap_err();
    assert!(matches!(err, StoreError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn wrong_method_is_status_error() {
    let (addr, _handle) = tasklist_store::server::start_server("127.0.0.1:0")
        .await
        .expect("failed to start store server");
    let resp = reqwest::Client::new()
        .get(format!("http://{addr}/api/addTask"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);
    let body: tasklist_proto::api::ErrorBody = resp.json().await.unwrap();
    assert_eq!(body.error, "Method Not Allowed");
}

// =============================================================================
// Full flow through the worker
// =============================================================================

async fn settle(
    core: &mut SyncCore,
    tx: &tokio::sync::mpsc::Sender<net::NetCommand>,
    rx: &mut tokio::sync::mpsc::Receiver<Completion>,
) -> Completion {
    let completion = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timeout waiting for completion")
        .expect("worker channel closed");
    let follow = core.apply(completion.clone());
    assert!(net::dispatch(tx, follow).is_empty());
    completion
}

#[tokio::test]
async fn add_edit_delete_through_worker() {
    let (store, _handle) = start_store().await;
    let store = Arc::new(store);
    let (tx, mut rx) = net::spawn_worker(Arc::clone(&store), 16);
    let mut core = SyncCore::new(SyncOptions {
        exit_delay: Duration::from_millis(20),
        ..SyncOptions::default()
    });

    // Initial load.
    let effect = core.refresh();
    assert!(net::dispatch(&tx, vec![effect]).is_empty());
    settle(&mut core, &tx, &mut rx).await;
    assert!(core.tasks().is_empty());

    // Add: Created, then the follow-up listing.
    core.set_input("  write report ");
    let effect = core.submit_add().unwrap();
    assert!(net::dispatch(&tx, vec![effect]).is_empty());
    settle(&mut core, &tx, &mut rx).await;
    settle(&mut core, &tx, &mut rx).await;
    assert_eq!(texts(core.tasks().as_slice()), vec!["write report"]);
    let id = core.tasks().as_slice()[0].id;

    // Edit.
    core.start_edit(id).unwrap();
    *core.draft_mut().unwrap() = "write summary".to_string();
    let effect = core.save_edit().unwrap();
    assert!(net::dispatch(&tx, vec![effect]).is_empty());
    let updated = settle(&mut core, &tx, &mut rx).await;
    assert!(matches!(updated, Completion::Updated { result: Ok(()), .. }));
    assert_eq!(store.list().await.unwrap()[0].text, "write summary");

    // Delete: both the store call and the exit timer settle.
    let effects = core.delete(id).unwrap();
    assert!(net::dispatch(&tx, effects).is_empty());
    settle(&mut core, &tx, &mut rx).await;
    settle(&mut core, &tx, &mut rx).await;
    assert_eq!(core.presence(id), Presence::Removed);
    assert!(core.interaction().error.is_none());
    assert!(store.list().await.unwrap().is_empty());
}
