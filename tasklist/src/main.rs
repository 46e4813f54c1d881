//! `tasklist`: terminal task list with optimistic updates.
//!
//! Launches the TUI against a task store. Configuration via CLI flags,
//! environment variables, or config file (`~/.config/tasklist/config.toml`).
//!
//! ```bash
//! # Against a running tasklist-store
//! cargo run --bin tasklist -- --store-url http://127.0.0.1:3000
//!
//! # Offline, against a seeded in-memory store
//! cargo run --bin tasklist -- --demo
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use tasklist::app::App;
use tasklist::config::{CliArgs, ClientConfig};
use tasklist::net::{self, NetCommand};
use tasklist::store::TaskStore;
use tasklist::store::http::HttpTaskStore;
use tasklist::store::memory::InMemoryTaskStore;
use tasklist::sync::{Completion, Effect, SyncCore};
use tasklist::ui;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > env > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Initialize logging before terminal setup (logs go to file, not stdout).
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(demo = config.demo, store = %config.base_url, "tasklist starting");

    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app.
    let result = if config.demo {
        run_app(&mut terminal, Arc::new(InMemoryTaskStore::demo()), &config).await
    } else {
        let store = HttpTaskStore::new(&config.base_url, config.request_timeout);
        run_app(&mut terminal, Arc::new(store), &config).await
    };

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("tasklist exiting");
    result
}

/// Initialize file-based logging.
///
/// Logs are written to a file (never stdout, since ratatui owns the terminal).
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("tasklist.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Main application loop.
async fn run_app<S: TaskStore + 'static>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    store: Arc<S>,
    config: &ClientConfig,
) -> io::Result<()> {
    let label = match store.kind() {
        tasklist::store::StoreKind::Http => format!("HTTP {}", config.base_url),
        tasklist::store::StoreKind::Memory => "Demo (in-memory)".to_string(),
    };
    let core = SyncCore::new(config.sync_options());
    let mut app = App::new(core, label).with_timestamp_format(config.timestamp_format.clone());

    let (cmd_tx, mut done_rx) = net::spawn_worker(store, config.channel_capacity);
    let initial = app.start();
    run_effects(&mut app, &cmd_tx, initial);

    loop {
        // Step 1: Draw the UI frame.
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Step 2: Drain all settled effects (non-blocking).
        drain_completions(&mut app, &cmd_tx, &mut done_rx);

        // Step 3: Poll for terminal input events.
        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let effects = app.handle_key_event(key);
            run_effects(&mut app, &cmd_tx, effects);
        }

        if app.should_quit {
            let _ = cmd_tx.try_send(NetCommand::Shutdown);
            return Ok(());
        }
    }
}

/// Hand effects to the worker. Anything that cannot be queued settles as a
/// failure right away, which may in turn produce more effects.
fn run_effects(app: &mut App, tx: &mpsc::Sender<NetCommand>, effects: Vec<Effect>) {
    let mut undelivered = net::dispatch(tx, effects);
    while let Some(completion) = undelivered.pop() {
        let follow = app.apply_completion(completion);
        undelivered.extend(net::dispatch(tx, follow));
    }
}

/// Drain all pending completions from the worker and apply them.
fn drain_completions(
    app: &mut App,
    tx: &mpsc::Sender<NetCommand>,
    rx: &mut mpsc::Receiver<Completion>,
) {
    while let Ok(completion) = rx.try_recv() {
        let follow = app.apply_completion(completion);
        run_effects(app, tx, follow);
    }
}
