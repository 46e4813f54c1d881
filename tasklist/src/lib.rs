//! Task list client library: optimistic synchronization core, task stores,
//! effect worker, configuration, and terminal UI.

pub mod app;
pub mod config;
pub mod net;
pub mod store;
pub mod sync;
pub mod ui;
