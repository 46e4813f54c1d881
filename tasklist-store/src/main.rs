//! Task list store server.
//!
//! An axum HTTP server holding the task table that the `tasklist` client
//! synchronizes against.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 127.0.0.1:3000, memory only
//! cargo run --bin tasklist-store
//!
//! # Custom address, persisted to a file
//! cargo run --bin tasklist-store -- --bind 0.0.0.0:8080 --data-file tasks.json
//! ```

use std::sync::Arc;

use clap::Parser;
use tasklist_store::config::{StoreCliArgs, StoreConfig};
use tasklist_store::server;
use tasklist_store::store::TaskTable;

#[tokio::main]
async fn main() {
    let cli = StoreCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match StoreConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting task store server");

    let table = match &config.data_file {
        Some(path) => match TaskTable::open(path) {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(error = %e, "failed to open data file");
                std::process::exit(1);
            }
        },
        None => TaskTable::new(),
    };

    match server::start_server_with_table(&config.bind_addr, Arc::new(table)).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "task store listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "task store server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start task store server");
            std::process::exit(1);
        }
    }
}
