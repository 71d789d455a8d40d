//! History Service
//!
//! Writes one audit entry per successful lookup and answers paginated,
//! filtered reads joined with the weather each entry referenced.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::auth::UserId;
use crate::error::Result;
use crate::history::{HistoryEntry, HistoryFilter, HistoryQuery, HistoryStore, HistoryView};
use crate::weather::{CoordinateKey, WeatherCacheStore};

/// Recorder and query engine over a [`HistoryStore`].
#[derive(Clone)]
pub struct HistoryService {
    history: Arc<dyn HistoryStore>,
    weather: Arc<dyn WeatherCacheStore>,
    /// Window inside which a joined record is labelled `cache`
    freshness: Duration,
}

impl HistoryService {
    pub fn new(
        history: Arc<dyn HistoryStore>,
        weather: Arc<dyn WeatherCacheStore>,
        freshness: Duration,
    ) -> Self {
        Self {
            history,
            weather,
            freshness,
        }
    }

    // == Record ==
    /// Appends an entry for a lookup answered by `weather_ref`.
    pub async fn record(
        &self,
        user_id: &UserId,
        key: CoordinateKey,
        weather_ref: Uuid,
        requested_at: DateTime<Utc>,
    ) -> Result<HistoryEntry> {
        let entry = HistoryEntry::new(user_id.clone(), key, weather_ref, requested_at);
        self.history.record(entry.clone()).await?;
        Ok(entry)
    }

    // == Query ==
    /// Returns one page of the caller's history.
    ///
    /// The `source` of each view is derived from the referenced record's age
    /// at `now`, not from how the lookup was first served.
    pub async fn query(&self, query: &HistoryQuery, now: DateTime<Utc>) -> Result<Vec<HistoryView>> {
        let entries = self.history.query(query).await?;
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut refs: Vec<Uuid> = entries.iter().map(|e| e.weather_ref).collect();
        refs.sort_unstable();
        refs.dedup();
        let records = self.weather.get_many(&refs).await?;

        let views = entries
            .iter()
            .map(|entry| {
                let record = records.get(&entry.weather_ref);
                if record.is_none() {
                    debug!(entry = %entry.id, weather = %entry.weather_ref, "weather record gone; using defaults");
                }
                HistoryView::project(entry, record, self.freshness, now)
            })
            .collect();
        Ok(views)
    }

    // == Count ==
    pub async fn count(&self, filter: &HistoryFilter) -> Result<u64> {
        self.history.count(filter).await
    }
}
