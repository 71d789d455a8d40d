//! TTL Entry Module
//!
//! A stored value together with the instants that bound its lifetime.

use chrono::{DateTime, Duration, Utc};

// == TTL Entry ==
/// A value with the time it was stored and the time it stops existing.
#[derive(Debug, Clone, PartialEq)]
pub struct TtlEntry<V> {
    /// The stored value
    pub value: V,
    /// When the value was written
    pub stored_at: DateTime<Utc>,
    /// Instant from which the entry is logically absent
    pub expires_at: DateTime<Utc>,
}

impl<V> TtlEntry<V> {
    pub fn new(value: V, stored_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value,
            stored_at,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once `now >= expires_at`, so an
    /// entry is live only while `expires_at` is strictly in the future.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    // == Age ==
    /// Time elapsed since the entry was stored. Negative if `stored_at` is
    /// ahead of `now` (clock skew between writers).
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.stored_at
    }

    // == Is Fresh ==
    /// Live and no older than `max_age`. The bound is inclusive.
    pub fn is_fresh(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && self.age(now) <= max_age
    }

    /// Remaining lifetime, or zero once expired.
    pub fn time_to_live(&self, now: DateTime<Utc>) -> Duration {
        if self.is_expired(now) {
            Duration::zero()
        } else {
            self.expires_at - now
        }
    }
}
