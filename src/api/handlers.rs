//! API Handlers
//!
//! HTTP request handlers for each weather ledger endpoint.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::api::{AuthenticatedUser, RequestRateLimiter};
use crate::auth::{InMemoryRevocationStore, RevocationStore};
use crate::config::Config;
use crate::error::Result;
use crate::history::{
    HistoryService, HistoryStore, HistoryView, InMemoryHistoryStore, SOURCE_FRESHNESS_MINUTES,
};
use crate::models::{
    ApiResponse, CountResponse, HealthResponse, HistoryParams, HistoryRequest, SignOutRequest,
    SignOutResponse, StatsResponse, WeatherQuery,
};
use crate::weather::{
    InMemoryWeatherCache, LookupOrchestrator, OpenWeatherFetcher, UpstreamFetcher,
    WeatherCacheStore, WeatherResponse,
};

/// Application state shared across all handlers.
///
/// Storage sits behind trait objects so a persistent backend can replace the
/// in-memory one without touching the handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: LookupOrchestrator,
    pub history: HistoryService,
    pub revocations: Arc<dyn RevocationStore>,
    pub weather_cache: Arc<dyn WeatherCacheStore>,
    pub rate_limiter: RequestRateLimiter,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the services over the given backends.
    pub fn new(
        config: Config,
        weather_cache: Arc<dyn WeatherCacheStore>,
        history_store: Arc<dyn HistoryStore>,
        revocations: Arc<dyn RevocationStore>,
        fetcher: Arc<dyn UpstreamFetcher>,
    ) -> Self {
        let history = HistoryService::new(
            history_store,
            weather_cache.clone(),
            Duration::minutes(SOURCE_FRESHNESS_MINUTES),
        );
        let orchestrator = LookupOrchestrator::new(
            weather_cache.clone(),
            fetcher,
            history.clone(),
            config.cache_ttl(),
        );

        let rate_limiter =
            RequestRateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window());

        Self {
            orchestrator,
            history,
            revocations,
            weather_cache,
            rate_limiter,
            config: Arc::new(config),
        }
    }

    /// In-memory stores and the OpenWeather client, configured from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = OpenWeatherFetcher::new(config)?;
        Ok(Self::new(
            config.clone(),
            Arc::new(InMemoryWeatherCache::new(config.cache_retention())),
            Arc::new(InMemoryHistoryStore::new()),
            Arc::new(InMemoryRevocationStore::new()),
            Arc::new(fetcher),
        ))
    }
}

/// Handler for GET /weather/current
pub async fn current_weather_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<ApiResponse<WeatherResponse>>> {
    let (lat, lon) = query.coordinates()?;
    let weather = state
        .orchestrator
        .get_current_weather(&user.user_id, lat, lon)
        .await?;

    Ok(Json(ApiResponse::ok(weather)))
}

/// Handler for GET /history
///
/// Returns a page of the caller's lookups, or only their total when
/// `count=true`.
pub async fn history_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<HistoryParams>,
) -> Result<Response> {
    let request = params.into_request(user.user_id, state.config.history_page_max_limit)?;

    match request {
        HistoryRequest::Count(filter) => {
            let total = state.history.count(&filter).await?;
            Ok(Json(ApiResponse::ok(CountResponse { total })).into_response())
        }
        HistoryRequest::Page(query) => {
            let views: Vec<HistoryView> = state.history.query(&query, Utc::now()).await?;
            Ok(Json(ApiResponse::ok(views)).into_response())
        }
    }
}

/// Handler for POST /auth/signout
///
/// The revocation lives until the token's own expiry. The gateway's
/// `X-Token-Expires-At` is authoritative; a body `expiresAt` can only shorten
/// it. Without the header, the body value is capped at the configured token
/// lifetime, which is also the fallback when neither is given.
pub async fn signout_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Option<Json<SignOutRequest>>,
) -> Result<Json<ApiResponse<SignOutResponse>>> {
    let now = Utc::now();
    let claimed = body.and_then(|Json(req)| req.expires_at);
    let expires_at = revocation_expiry(user.expires_at, claimed, now, state.config.token_lifetime());

    state
        .revocations
        .revoke(&user.token_id, &user.user_id, expires_at, now)
        .await?;
    info!(user_id = %user.user_id, %expires_at, "user signed out");

    Ok(Json(ApiResponse::ok(SignOutResponse::signed_out())))
}

fn revocation_expiry(
    gateway: Option<DateTime<Utc>>,
    claimed: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    lifetime: Duration,
) -> DateTime<Utc> {
    let ceiling = gateway.unwrap_or_else(|| {
        now.checked_add_signed(lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    });
    claimed.map_or(ceiling, |claimed| claimed.min(ceiling))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<ApiResponse<StatsResponse>> {
    let stats = state.weather_cache.stats().await;
    Json(ApiResponse::ok(StatsResponse::from(stats)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
