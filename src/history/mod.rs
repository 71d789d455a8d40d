//! Lookup history: the audit log written by every successful lookup and the
//! query engine that reads it back.

mod model;
mod query;
mod service;
mod store;


pub use model::{HistoryEntry, HistorySource, HistoryView, SOURCE_FRESHNESS_MINUTES};
pub use query::{
    HistoryFilter, HistoryQuery, HistorySort, Page, SortField, SortOrder, DEFAULT_PAGE_LIMIT,
    MAX_PAGE_LIMIT,
};
pub use service::HistoryService;
pub use store::{HistoryStore, InMemoryHistoryStore};
