//! History entry and its read-side projection.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::UserId;
use crate::weather::{CoordinateKey, Coordinates, WeatherRecord, NO_DESCRIPTION};

// == History Entry ==
/// One successful lookup. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub user_id: UserId,
    pub key: CoordinateKey,
    /// Weather record that answered the lookup
    pub weather_ref: Uuid,
    pub requested_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(
        user_id: UserId,
        key: CoordinateKey,
        weather_ref: Uuid,
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            key,
            weather_ref,
            requested_at,
        }
    }
}

/// Window inside which a history view labels its weather `cache`. Fixed,
/// independent of the lookup TTL.
pub const SOURCE_FRESHNESS_MINUTES: i64 = 30;

// == History Source ==
/// Freshness label computed when history is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistorySource {
    /// Referenced record is still within the freshness window
    Cache,
    /// Referenced record is older, or gone
    Historical,
}

// == History View ==
/// A history entry joined with the weather it referenced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryView {
    pub id: Uuid,
    pub coordinates: Coordinates,
    pub requested_at: DateTime<Utc>,
    #[serde(rename = "tempC")]
    pub temp_c: f64,
    pub humidity: f64,
    pub description: String,
    pub source: HistorySource,
}

impl HistoryView {
    /// Joins `entry` with its weather record as seen at `now`.
    ///
    /// A missing record degrades to default readings labelled historical.
    pub fn project(
        entry: &HistoryEntry,
        weather: Option<&WeatherRecord>,
        freshness: chrono::Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let (temp_c, humidity, description, source) = match weather {
            Some(record) => {
                let source = if now - record.fetched_at <= freshness {
                    HistorySource::Cache
                } else {
                    HistorySource::Historical
                };
                (
                    record.payload.temperature_celsius(),
                    record.payload.humidity_percent(),
                    record.payload.description(),
                    source,
                )
            }
            None => (
                0.0,
                0.0,
                NO_DESCRIPTION.to_string(),
                HistorySource::Historical,
            ),
        };

        Self {
            id: entry.id,
            coordinates: entry.key.coordinates(),
            requested_at: entry.requested_at,
            temp_c,
            humidity,
            description,
            source,
        }
    }
}
