//! Lookup Orchestrator
//!
//! Serves `getCurrentWeather`: normalize, read through the cache, fall back
//! to the upstream provider on a miss, then audit the lookup.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::auth::UserId;
use crate::error::{LedgerError, Result};
use crate::history::HistoryService;
use crate::weather::{
    CoordinateKey, Coordinates, UpstreamFetcher, WeatherCacheStore, WeatherRecord,
};

/// Label for responses answered from the cache.
pub const CACHE_SOURCE: &str = "cache";

// == Weather Source ==
/// Where this particular call got its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherSource {
    Cache,
    /// Named upstream provider
    Upstream(String),
}

impl WeatherSource {
    pub fn as_str(&self) -> &str {
        match self {
            WeatherSource::Cache => CACHE_SOURCE,
            WeatherSource::Upstream(name) => name,
        }
    }
}

impl Serialize for WeatherSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// == Weather Response ==
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherResponse {
    pub source: WeatherSource,
    pub coordinates: Coordinates,
    pub temperature_celsius: f64,
    pub humidity_percent: f64,
    pub description: String,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherResponse {
    pub fn from_record(record: &WeatherRecord, source: WeatherSource) -> Self {
        Self {
            source,
            coordinates: record.key.coordinates(),
            temperature_celsius: record.payload.temperature_celsius(),
            humidity_percent: record.payload.humidity_percent(),
            description: record.payload.description(),
            fetched_at: record.fetched_at,
        }
    }
}

// == Orchestrator ==
#[derive(Clone)]
pub struct LookupOrchestrator {
    cache: Arc<dyn WeatherCacheStore>,
    fetcher: Arc<dyn UpstreamFetcher>,
    history: HistoryService,
    ttl: Duration,
}

impl LookupOrchestrator {
    pub fn new(
        cache: Arc<dyn WeatherCacheStore>,
        fetcher: Arc<dyn UpstreamFetcher>,
        history: HistoryService,
        ttl: Duration,
    ) -> Self {
        Self {
            cache,
            fetcher,
            history,
            ttl,
        }
    }

    // == Get Current Weather ==
    /// Returns current conditions for `(lat, lon)` on behalf of `user_id`.
    ///
    /// Upstream failures propagate and leave neither a cache entry nor a
    /// history entry. Once weather is resolved, the history write is
    /// best-effort: its failure is logged and the response still returned.
    ///
    /// Concurrent misses on one key may each fetch and upsert; the last
    /// write wins and every caller reports the source of its own call.
    pub async fn get_current_weather(
        &self,
        user_id: &UserId,
        lat: f64,
        lon: f64,
    ) -> Result<WeatherResponse> {
        let key = CoordinateKey::normalize(lat, lon)?;
        let (record, source) = self.resolve(key).await?;

        self.record_history(user_id, &record).await;

        Ok(WeatherResponse::from_record(&record, source))
    }

    async fn resolve(&self, key: CoordinateKey) -> Result<(WeatherRecord, WeatherSource)> {
        if let Some(record) = self.cache.lookup(key, self.ttl, Utc::now()).await? {
            debug!(%key, "weather cache hit");
            return Ok((record, WeatherSource::Cache));
        }

        debug!(%key, upstream = self.fetcher.name(), "weather cache miss");
        let payload = self.fetcher.fetch(key).await.map_err(|err| {
            warn!(%key, error = %err, "upstream weather fetch failed");
            LedgerError::from(err)
        })?;

        let record = self.cache.upsert(key, payload, Utc::now()).await?;
        info!(%key, record = %record.id, "cached fresh weather");
        Ok((record, WeatherSource::Upstream(self.fetcher.name().to_string())))
    }

    async fn record_history(&self, user_id: &UserId, record: &WeatherRecord) {
        if let Err(err) = self
            .history
            .record(user_id, record.key, record.id, Utc::now())
            .await
        {
            warn!(%user_id, key = %record.key, error = %err, "failed to record lookup history");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{
        HistoryEntry, HistoryFilter, HistoryQuery, HistorySource, HistoryStore,
        InMemoryHistoryStore,
    };
    use crate::weather::{FetchError, InMemoryWeatherCache, WeatherPayload};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // == Test Doubles ==
    struct ScriptedFetcher {
        calls: AtomicUsize,
        outcome: Mutex<std::result::Result<WeatherPayload, FetchError>>,
    }

    impl ScriptedFetcher {
        fn ok(payload: WeatherPayload) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                outcome: Mutex::new(Ok(payload)),
            }
        }

        fn failing(err: FetchError) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                outcome: Mutex::new(Err(err)),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UpstreamFetcher for ScriptedFetcher {
        fn name(&self) -> &str {
            "openweather"
        }

        async fn fetch(&self, _key: CoordinateKey) -> std::result::Result<WeatherPayload, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.lock().unwrap().clone()
        }
    }

    struct BrokenHistoryStore;

    #[async_trait]
    impl HistoryStore for BrokenHistoryStore {
        async fn record(&self, _entry: HistoryEntry) -> Result<()> {
            Err(LedgerError::Storage("history collection unavailable".into()))
        }

        async fn query(&self, _query: &HistoryQuery) -> Result<Vec<HistoryEntry>> {
            Err(LedgerError::Storage("history collection unavailable".into()))
        }

        async fn count(&self, _filter: &HistoryFilter) -> Result<u64> {
            Err(LedgerError::Storage("history collection unavailable".into()))
        }
    }

    struct Fixture {
        orchestrator: LookupOrchestrator,
        cache: Arc<InMemoryWeatherCache>,
        history: Arc<InMemoryHistoryStore>,
        fetcher: Arc<ScriptedFetcher>,
    }

    fn fixture(fetcher: ScriptedFetcher) -> Fixture {
        let cache = Arc::new(InMemoryWeatherCache::new(Duration::hours(2)));
        let history = Arc::new(InMemoryHistoryStore::new());
        let fetcher = Arc::new(fetcher);
        let service = HistoryService::new(history.clone(), cache.clone(), Duration::minutes(30));
        let orchestrator =
            LookupOrchestrator::new(cache.clone(), fetcher.clone(), service, Duration::minutes(30));
        Fixture {
            orchestrator,
            cache,
            history,
            fetcher,
        }
    }

    fn user() -> UserId {
        UserId::new("user-1")
    }

    fn sunny() -> WeatherPayload {
        WeatherPayload::from_readings(24.5, 40.0, "clear sky")
    }

    #[tokio::test]
    async fn test_miss_fetches_caches_and_records() {
        let fx = fixture(ScriptedFetcher::ok(sunny()));

        let response = fx
            .orchestrator
            .get_current_weather(&user(), 40.7128, -74.006)
            .await
            .unwrap();

        assert_eq!(response.source, WeatherSource::Upstream("openweather".into()));
        assert_eq!(response.coordinates, Coordinates { lat: 40.71, lon: -74.01 });
        assert_eq!(response.temperature_celsius, 24.5);
        assert_eq!(response.humidity_percent, 40.0);
        assert_eq!(response.description, "clear sky");
        assert_eq!(fx.fetcher.calls(), 1);
        assert_eq!(fx.cache.len().await, 1);
        assert_eq!(fx.history.len().await, 1);
    }

    #[tokio::test]
    async fn test_nearby_second_lookup_is_cache_hit() {
        let fx = fixture(ScriptedFetcher::ok(sunny()));

        fx.orchestrator
            .get_current_weather(&user(), 40.7128, -74.006)
            .await
            .unwrap();
        let second = fx
            .orchestrator
            .get_current_weather(&user(), 40.71276, -74.00604)
            .await
            .unwrap();

        assert_eq!(second.source, WeatherSource::Cache);
        assert_eq!(fx.fetcher.calls(), 1);
        assert_eq!(fx.history.len().await, 2, "hits are audited too");
    }

    #[tokio::test]
    async fn test_stale_record_triggers_refetch() {
        let fx = fixture(ScriptedFetcher::ok(sunny()));
        let key = CoordinateKey::normalize(10.0, 10.0).unwrap();
        let stale = fx
            .cache
            .insert_at(key, WeatherPayload::default(), Utc::now() - Duration::minutes(31))
            .await;

        let response = fx
            .orchestrator
            .get_current_weather(&user(), 10.0, 10.0)
            .await
            .unwrap();

        assert_eq!(response.source.as_str(), "openweather");
        assert_eq!(fx.fetcher.calls(), 1);
        assert!(response.fetched_at > stale.fetched_at);
        assert_eq!(fx.cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_upstream_failure_writes_nothing() {
        for err in [
            FetchError::Unavailable("503".into()),
            FetchError::Misconfigured("no key".into()),
            FetchError::UpstreamError("401".into()),
        ] {
            let fx = fixture(ScriptedFetcher::failing(err));

            let result = fx.orchestrator.get_current_weather(&user(), 1.0, 1.0).await;

            assert!(result.is_err());
            assert!(fx.cache.is_empty().await);
            assert!(fx.history.is_empty().await);
        }
    }

    #[tokio::test]
    async fn test_upstream_failures_stay_distinguishable() {
        let fx = fixture(ScriptedFetcher::failing(FetchError::Unavailable("503".into())));
        let err = fx
            .orchestrator
            .get_current_weather(&user(), 1.0, 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::UpstreamUnavailable(_)));

        let fx = fixture(ScriptedFetcher::failing(FetchError::Misconfigured("no key".into())));
        let err = fx
            .orchestrator
            .get_current_weather(&user(), 1.0, 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::UpstreamMisconfigured(_)));
    }

    #[tokio::test]
    async fn test_history_failure_does_not_fail_lookup() {
        let cache = Arc::new(InMemoryWeatherCache::new(Duration::hours(2)));
        let service = HistoryService::new(
            Arc::new(BrokenHistoryStore),
            cache.clone(),
            Duration::minutes(30),
        );
        let orchestrator = LookupOrchestrator::new(
            cache.clone(),
            Arc::new(ScriptedFetcher::ok(sunny())),
            service,
            Duration::minutes(30),
        );

        let response = orchestrator
            .get_current_weather(&user(), 1.0, 1.0)
            .await
            .unwrap();

        assert_eq!(response.description, "clear sky");
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_coordinates_never_reach_upstream() {
        let fx = fixture(ScriptedFetcher::ok(sunny()));

        let err = fx
            .orchestrator
            .get_current_weather(&user(), 91.0, 0.0)
            .await
            .unwrap_err();

        assert_eq!(err.code(), "COORDINATES_OUT_OF_RANGE");
        assert_eq!(fx.fetcher.calls(), 0);
        assert!(fx.history.is_empty().await);
    }

    #[tokio::test]
    async fn test_history_references_resolved_record() {
        let fx = fixture(ScriptedFetcher::ok(sunny()));

        fx.orchestrator
            .get_current_weather(&user(), 5.0, 5.0)
            .await
            .unwrap();
        fx.orchestrator
            .get_current_weather(&user(), 5.0, 5.0)
            .await
            .unwrap();

        let entries = fx
            .history
            .query(&HistoryQuery::new(HistoryFilter::for_user(user())))
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].weather_ref, entries[1].weather_ref);
    }

    /// Holds each fetch until both callers are inside it, so both have
    /// already missed the cache.
    struct GatedFetcher {
        gate: tokio::sync::Barrier,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl UpstreamFetcher for GatedFetcher {
        fn name(&self) -> &str {
            "openweather"
        }

        async fn fetch(&self, _key: CoordinateKey) -> std::result::Result<WeatherPayload, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.wait().await;
            Ok(sunny())
        }
    }

    #[tokio::test]
    async fn test_concurrent_misses_each_fetch_and_share_one_record() {
        let cache = Arc::new(InMemoryWeatherCache::new(Duration::hours(2)));
        let history = Arc::new(InMemoryHistoryStore::new());
        let fetcher = Arc::new(GatedFetcher {
            gate: tokio::sync::Barrier::new(2),
            calls: AtomicUsize::new(0),
        });
        let service = HistoryService::new(history.clone(), cache.clone(), Duration::minutes(30));
        let orchestrator =
            LookupOrchestrator::new(cache.clone(), fetcher.clone(), service, Duration::minutes(30));

        let alice = UserId::new("alice");
        let bob = UserId::new("bob");
        let (first, second) = tokio::join!(
            orchestrator.get_current_weather(&alice, 40.7128, -74.006),
            orchestrator.get_current_weather(&bob, 40.7128, -74.006),
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_eq!(first.source.as_str(), "openweather");
        assert_eq!(second.source.as_str(), "openweather");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 1);
        assert_eq!(history.len().await, 2);

        let queries: Vec<_> = [alice, bob]
            .into_iter()
            .map(|user| HistoryQuery::new(HistoryFilter::for_user(user)))
            .collect();
        let mut weather_refs = Vec::new();
        for query in &queries {
            let entries = history.query(query).await.unwrap();
            assert_eq!(entries.len(), 1);
            weather_refs.push(entries[0].weather_ref);
        }
        assert_eq!(weather_refs[0], weather_refs[1], "both audits point at the one record");
    }

    #[tokio::test]
    async fn test_upstream_lookup_reads_back_as_cache_while_fresh() {
        let fx = fixture(ScriptedFetcher::ok(sunny()));

        let response = fx
            .orchestrator
            .get_current_weather(&user(), 5.0, 5.0)
            .await
            .unwrap();
        assert_eq!(response.source.as_str(), "openweather");

        let query = HistoryQuery::new(HistoryFilter::for_user(user()));
        let fresh = fx.orchestrator.history.query(&query, Utc::now()).await.unwrap();
        assert_eq!(fresh[0].source, HistorySource::Cache);

        let later = fx
            .orchestrator
            .history
            .query(&query, Utc::now() + Duration::minutes(31))
            .await
            .unwrap();
        assert_eq!(later[0].source, HistorySource::Historical);
    }

    #[test]
    fn test_response_serializes_source_label() {
        let record = WeatherRecord {
            id: uuid::Uuid::new_v4(),
            key: CoordinateKey::normalize(1.0, 2.0).unwrap(),
            payload: sunny(),
            fetched_at: Utc::now(),
        };
        let json = serde_json::to_value(WeatherResponse::from_record(&record, WeatherSource::Cache))
            .unwrap();

        assert_eq!(json["source"], "cache");
        assert_eq!(json["temperatureCelsius"], 24.5);
        assert_eq!(json["humidityPercent"], 40.0);
        assert!(json.get("fetchedAt").is_some());
    }
}
