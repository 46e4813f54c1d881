//! Effect worker bridging the synchronous TUI loop and the async task store.
//!
//! The TUI main thread owns the [`SyncCore`](crate::sync::SyncCore). It
//! sends every [`Effect`] the core returns as a [`NetCommand`], and drains
//! [`Completion`]s on each tick of the poll-based event loop.
//!
//! # Architecture
//!
//! ```text
//! TUI (main thread)  ←── Completion ──  tokio background tasks
//!                     ─── NetCommand →
//! ```
//!
//! The dispatcher spawns one task per effect, so a slow store call never
//! delays another call or an exit timer.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::store::TaskStore;
use crate::sync::{Completion, Effect};

/// Default channel capacity for commands and completions.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Commands sent from the TUI main loop to the worker.
#[derive(Debug)]
pub enum NetCommand {
    /// Run an effect and report its completion.
    Run(Effect),
    /// Stop accepting effects. Effects already running still complete.
    Shutdown,
}

/// Spawn the effect dispatcher and return its channel handles.
///
/// Must be called from within a tokio runtime.
pub fn spawn_worker<S: TaskStore + 'static>(
    store: Arc<S>,
    channel_capacity: usize,
) -> (mpsc::Sender<NetCommand>, mpsc::Receiver<Completion>) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<NetCommand>(channel_capacity);
    let (done_tx, done_rx) = mpsc::channel::<Completion>(channel_capacity);

    tokio::spawn(async move {
        dispatcher(store, cmd_rx, done_tx).await;
    });

    (cmd_tx, done_rx)
}

/// Background task: spawn one task per incoming effect.
async fn dispatcher<S: TaskStore + 'static>(
    store: Arc<S>,
    mut cmd_rx: mpsc::Receiver<NetCommand>,
    done_tx: mpsc::Sender<Completion>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            NetCommand::Run(effect) => {
                let store = Arc::clone(&store);
                let done_tx = done_tx.clone();
                tokio::spawn(async move {
                    let completion = run_effect(store.as_ref(), effect).await;
                    if done_tx.send(completion).await.is_err() {
                        tracing::debug!("completion dropped, TUI gone");
                    }
                });
            }
            NetCommand::Shutdown => {
                tracing::info!("effect worker shutting down");
                break;
            }
        }
    }
}

/// Run a single effect against `store` and return its completion.
///
/// Exit timers sleep on the tokio clock, so tests can drive them with a
/// paused runtime.
pub async fn run_effect<S: TaskStore>(store: &S, effect: Effect) -> Completion {
    tracing::trace!(?effect, "running effect");
    match effect {
        Effect::List { op } => Completion::Listed {
            op,
            result: store.list().await,
        },
        Effect::Create { op, text } => Completion::Created {
            op,
            result: store.create(&text).await,
        },
        Effect::Update { op, id, text } => Completion::Updated {
            op,
            result: store.update(id, &text).await,
        },
        Effect::Delete { op, id } => Completion::Deleted {
            op,
            result: store.delete(id).await,
        },
        Effect::ExpireExit { op, id, after } => {
            tokio::time::sleep(after).await;
            Completion::ExitElapsed { op, id }
        }
    }
}

/// Queue `effects` without blocking.
///
/// An effect that cannot be queued (channel full or worker gone) is turned
/// into its failure completion and returned, so the caller can apply it
/// immediately instead of waiting forever.
pub fn dispatch(tx: &mpsc::Sender<NetCommand>, effects: Vec<Effect>) -> Vec<Completion> {
    let mut undelivered = Vec::new();
    for effect in effects {
        if let Err(err) = tx.try_send(NetCommand::Run(effect)) {
            let NetCommand::Run(effect) = err.into_inner() else {
                continue;
            };
            tracing::warn!(op = %effect.op(), "effect could not be queued");
            undelivered.push(effect.undeliverable());
        }
    }
    undelivered
}
