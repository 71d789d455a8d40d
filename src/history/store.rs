//! History Store
//!
//! Append-only log of lookups, partitioned by user. The in-memory backend
//! keeps each user's entries together, which mirrors a `(user, requestedAt)`
//! compound index in a document store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::auth::UserId;
use crate::error::Result;
use crate::history::{HistoryEntry, HistoryFilter, HistoryQuery};

/// Storage contract for lookup history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Appends one immutable entry.
    async fn record(&self, entry: HistoryEntry) -> Result<()>;

    /// Filters, sorts, then applies `skip` and `limit`.
    async fn query(&self, query: &HistoryQuery) -> Result<Vec<HistoryEntry>>;

    /// Number of entries matching `filter`.
    async fn count(&self, filter: &HistoryFilter) -> Result<u64>;
}

#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    by_user: RwLock<HashMap<UserId, Vec<HistoryEntry>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total entries across all users.
    pub async fn len(&self) -> usize {
        self.by_user.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn record(&self, entry: HistoryEntry) -> Result<()> {
        self.by_user
            .write()
            .await
            .entry(entry.user_id.clone())
            .or_default()
            .push(entry);
        Ok(())
    }

    async fn query(&self, query: &HistoryQuery) -> Result<Vec<HistoryEntry>> {
        let by_user = self.by_user.read().await;
        let Some(entries) = by_user.get(&query.filter.user_id) else {
            return Ok(Vec::new());
        };

        let mut matching: Vec<&HistoryEntry> = entries
            .iter()
            .filter(|entry| query.filter.matches(entry))
            .collect();
        matching.sort_by(|a, b| query.sort.compare(a, b));

        Ok(matching
            .into_iter()
            .skip(query.page.skip)
            .take(query.page.limit)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &HistoryFilter) -> Result<u64> {
        let by_user = self.by_user.read().await;
        Ok(by_user
            .get(&filter.user_id)
            .map(|entries| entries.iter().filter(|e| filter.matches(e)).count() as u64)
            .unwrap_or(0))
    }
}
