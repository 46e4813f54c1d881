//! Task list store server library.
//!
//! Exposes the reference HTTP task store for use in tests and embedding.
//! The server keeps tasks in memory (optionally persisted to a JSON file)
//! and serves the list/create/update/delete contract of `tasklist-proto`.

pub mod config;
pub mod server;
pub mod store;
