//! Weather Cache Store
//!
//! Coordinate-keyed weather records with age-based freshness. A record is
//! created or replaced on every upstream fetch and is never deleted by the
//! lookup path; housekeeping purges it once it passes the retention ceiling.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::store::{CacheStats, TtlStore};
use crate::weather::{CoordinateKey, WeatherPayload};

// == Weather Record ==
/// One cached upstream response, shared by every user who looks up its key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    /// Stable identity; kept across upserts of the same key
    pub id: Uuid,
    pub key: CoordinateKey,
    pub payload: WeatherPayload,
    pub fetched_at: DateTime<Utc>,
}

// == Store Trait ==
/// Storage contract for cached weather.
///
/// Every method is individually atomic; no lock is held across calls.
#[async_trait]
pub trait WeatherCacheStore: Send + Sync {
    /// Returns the record for `key` if `now - fetched_at <= max_age`.
    ///
    /// A stale record that is still physically present is a miss.
    async fn lookup(
        &self,
        key: CoordinateKey,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<WeatherRecord>>;

    /// Creates or replaces the record for `key` with `fetched_at = now`.
    ///
    /// Concurrent upserts of one key are last-write-wins; readers never see
    /// a partially written record.
    async fn upsert(
        &self,
        key: CoordinateKey,
        payload: WeatherPayload,
        now: DateTime<Utc>,
    ) -> Result<WeatherRecord>;

    /// Fetches records by id regardless of freshness. Missing ids are
    /// absent from the result.
    async fn get_many(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, WeatherRecord>>;

    /// Physically removes records older than the retention ceiling.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;

    async fn stats(&self) -> CacheStats;
}

// == In-Memory Implementation ==
#[derive(Debug, Default)]
struct WeatherTables {
    records: TtlStore<CoordinateKey, WeatherRecord>,
    ids: HashMap<Uuid, CoordinateKey>,
}

/// Process-local weather cache guarded by a single async lock.
#[derive(Debug)]
pub struct InMemoryWeatherCache {
    tables: RwLock<WeatherTables>,
    retention: Duration,
}

impl InMemoryWeatherCache {
    /// Creates a cache whose records are purged `retention` after fetch.
    pub fn new(retention: Duration) -> Self {
        Self {
            tables: RwLock::new(WeatherTables::default()),
            retention,
        }
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Writes a record with an explicit fetch time, bypassing the clock.
    ///
    /// Used to seed fixtures and to backfill from another store.
    pub async fn insert_at(
        &self,
        key: CoordinateKey,
        payload: WeatherPayload,
        fetched_at: DateTime<Utc>,
    ) -> WeatherRecord {
        let mut tables = self.tables.write().await;
        Self::write(&mut tables, key, payload, fetched_at, self.retention)
    }

    fn write(
        tables: &mut WeatherTables,
        key: CoordinateKey,
        payload: WeatherPayload,
        fetched_at: DateTime<Utc>,
        retention: Duration,
    ) -> WeatherRecord {
        let id = tables
            .records
            .peek(&key)
            .map(|entry| entry.value.id)
            .unwrap_or_else(Uuid::new_v4);

        let record = WeatherRecord {
            id,
            key,
            payload,
            fetched_at,
        };
        tables
            .records
            .put(key, record.clone(), fetched_at, expiry(fetched_at, retention));
        tables.ids.insert(id, key);
        record
    }
}

fn expiry(fetched_at: DateTime<Utc>, retention: Duration) -> DateTime<Utc> {
    fetched_at
        .checked_add_signed(retention)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[async_trait]
impl WeatherCacheStore for InMemoryWeatherCache {
    async fn lookup(
        &self,
        key: CoordinateKey,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<WeatherRecord>> {
        // Write lock: lookups update hit/miss counters
        let mut tables = self.tables.write().await;
        Ok(tables
            .records
            .get_fresh(&key, max_age, now)
            .map(|entry| entry.value.clone()))
    }

    async fn upsert(
        &self,
        key: CoordinateKey,
        payload: WeatherPayload,
        now: DateTime<Utc>,
    ) -> Result<WeatherRecord> {
        let mut tables = self.tables.write().await;
        Ok(Self::write(&mut tables, key, payload, now, self.retention))
    }

    async fn get_many(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, WeatherRecord>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.ids.get(id))
            .filter_map(|key| tables.records.peek(key))
            .map(|entry| (entry.value.id, entry.value.clone()))
            .collect())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut tables = self.tables.write().await;
        let purged = tables.records.purge_expired(now);
        for (_, entry) in &purged {
            tables.ids.remove(&entry.value.id);
        }
        Ok(purged.len())
    }

    async fn stats(&self) -> CacheStats {
        self.tables.read().await.records.stats()
    }
}
