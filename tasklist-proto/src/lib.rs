//! Shared wire definitions for the task list client and store.

pub mod api;
pub mod task;
