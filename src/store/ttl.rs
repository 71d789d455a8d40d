//! TTL Store Module
//!
//! Keyed storage where every entry carries its own lifetime. Stale entries may
//! remain physically present until purged, but reads never return them.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Duration, Utc};

use crate::store::{CacheStats, TtlEntry};

// == TTL Store ==
/// Time-bounded key/value storage with replace-on-write semantics.
///
/// At most one entry exists per key. Callers pass `now` explicitly so that
/// freshness decisions are made against a single instant per operation.
#[derive(Debug)]
pub struct TtlStore<K, V> {
    entries: HashMap<K, TtlEntry<V>>,
    stats: CacheStats,
}

impl<K, V> Default for TtlStore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TtlStore<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
        }
    }

    // == Put ==
    /// Creates or replaces the entry for `key`, returning the previous one.
    pub fn put(
        &mut self,
        key: K,
        value: V,
        stored_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Option<TtlEntry<V>> {
        let previous = self
            .entries
            .insert(key, TtlEntry::new(value, stored_at, expires_at));
        self.stats.set_total_entries(self.entries.len());
        previous
    }

    // == Put If Absent ==
    /// Inserts only when no live entry exists for `key`.
    ///
    /// A stale entry is replaced. Returns `true` if the value was written.
    pub fn put_if_absent(
        &mut self,
        key: K,
        value: V,
        stored_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> bool {
        let live = self
            .entries
            .get(&key)
            .is_some_and(|entry| !entry.is_expired(stored_at));
        if live {
            return false;
        }

        self.put(key, value, stored_at, expires_at);
        true
    }

    // == Get Fresh ==
    /// Returns the entry only if it is live and no older than `max_age`.
    ///
    /// A physically present but stale entry counts as a miss.
    pub fn get_fresh(
        &mut self,
        key: &K,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Option<&TtlEntry<V>> {
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh(max_age, now) => {
                self.stats.record_hit();
                Some(entry)
            }
            _ => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Get Live ==
    /// Returns the entry if it has not yet reached its expiry.
    pub fn get_live(&mut self, key: &K, now: DateTime<Utc>) -> Option<&TtlEntry<V>> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                self.stats.record_hit();
                Some(entry)
            }
            _ => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Peek ==
    /// Returns the entry regardless of expiry, without touching statistics.
    pub fn peek(&self, key: &K) -> Option<&TtlEntry<V>> {
        self.entries.get(key)
    }

    // == Remove ==
    pub fn remove(&mut self, key: &K) -> Option<TtlEntry<V>> {
        let removed = self.entries.remove(key);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Purge Expired ==
    /// Physically removes every entry expired at `now` and hands them back.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> Vec<(K, TtlEntry<V>)> {
        let expired_keys: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        let purged: Vec<(K, TtlEntry<V>)> = expired_keys
            .into_iter()
            .filter_map(|key| self.entries.remove(&key).map(|entry| (key, entry)))
            .collect();

        self.stats.record_purged(purged.len());
        self.stats.set_total_entries(self.entries.len());
        purged
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Number of physically held entries, live or stale.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
