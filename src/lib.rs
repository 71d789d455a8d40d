//! Weather Ledger - cached weather lookups with a per-user audit trail
//!
//! Serves current conditions for a coordinate pair through a short-lived
//! cache in front of an upstream provider, records every lookup in the
//! caller's history, and keeps the list of signed-out tokens.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod history;
pub mod models;
pub mod store;
pub mod tasks;
pub mod weather;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{LedgerError, Result};
pub use tasks::spawn_cleanup_task;
