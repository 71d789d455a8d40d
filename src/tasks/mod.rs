//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Retention cleanup: drops stale weather records and expired revocations

mod cleanup;

pub use cleanup::{run_cleanup, spawn_cleanup_task, CleanupReport};
