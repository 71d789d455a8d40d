//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tracing::warn;

/// Default OpenWeather endpoint used when `OPENWEATHER_BASE_URL` is unset.
pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

const DEFAULT_CACHE_TTL_MINUTES: i64 = 30;
const DEFAULT_CACHE_RETENTION_HOURS: i64 = 2;
const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Minutes a cached weather record counts as fresh
    pub cache_ttl_minutes: i64,
    /// Hours after which weather records are physically purged
    pub cache_retention_hours: i64,
    /// Upper bound for history page sizes
    pub history_page_max_limit: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Timeout applied to every upstream weather call, in seconds
    pub upstream_timeout_secs: u64,
    /// OpenWeather API key; lookups fail as misconfigured without it
    pub openweather_api_key: Option<String>,
    /// OpenWeather base URL
    pub openweather_base_url: String,
    /// Assumed token lifetime when sign-out cannot name the real expiry
    pub token_lifetime_hours: i64,
    /// Length of the per-client rate limit window, in milliseconds
    pub rate_limit_window_ms: u64,
    /// Requests a single client may make per window
    pub rate_limit_max_requests: u32,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_MINUTES` - Cache freshness window (default: 30)
    /// - `CACHE_RETENTION_HOURS` - Hard retention ceiling (default: 2)
    /// - `HISTORY_PAGE_MAX_LIMIT` - Maximum history page size (default: 100)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    /// - `UPSTREAM_TIMEOUT_SECS` - Upstream call timeout (default: 10)
    /// - `OPENWEATHER_API_KEY` - Upstream credential (no default)
    /// - `OPENWEATHER_BASE_URL` - Upstream endpoint
    /// - `TOKEN_LIFETIME_HOURS` - Fallback token lifetime (default: 24)
    /// - `RATE_LIMIT_WINDOW_MS` - Rate limit window (default: 60000)
    /// - `RATE_LIMIT_MAX_REQUESTS` - Requests per window per client (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            cache_ttl_minutes: parse_var("CACHE_TTL_MINUTES", defaults.cache_ttl_minutes),
            cache_retention_hours: parse_var(
                "CACHE_RETENTION_HOURS",
                defaults.cache_retention_hours,
            ),
            history_page_max_limit: parse_var(
                "HISTORY_PAGE_MAX_LIMIT",
                defaults.history_page_max_limit,
            ),
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL", defaults.cleanup_interval),
            upstream_timeout_secs: parse_var(
                "UPSTREAM_TIMEOUT_SECS",
                defaults.upstream_timeout_secs,
            ),
            openweather_api_key: env::var("OPENWEATHER_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            openweather_base_url: env::var("OPENWEATHER_BASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.openweather_base_url),
            token_lifetime_hours: parse_var("TOKEN_LIFETIME_HOURS", defaults.token_lifetime_hours),
            rate_limit_window_ms: parse_var("RATE_LIMIT_WINDOW_MS", defaults.rate_limit_window_ms),
            rate_limit_max_requests: parse_var(
                "RATE_LIMIT_MAX_REQUESTS",
                defaults.rate_limit_max_requests,
            ),
        };

        if config.ttl_exceeds_retention() {
            warn!(
                cache_ttl_minutes = config.cache_ttl_minutes,
                cache_retention_hours = config.cache_retention_hours,
                "CACHE_TTL_MINUTES exceeds CACHE_RETENTION_HOURS; records expire at the retention ceiling"
            );
        }
        config
    }

    /// Freshness window used by cache lookups.
    ///
    /// Non-positive or unrepresentable values fall back to 30 minutes.
    pub fn cache_ttl(&self) -> Duration {
        positive(Duration::try_minutes(self.cache_ttl_minutes))
            .unwrap_or_else(|| Duration::minutes(DEFAULT_CACHE_TTL_MINUTES))
    }

    /// Age after which weather records are purged by housekeeping.
    pub fn cache_retention(&self) -> Duration {
        positive(Duration::try_hours(self.cache_retention_hours))
            .unwrap_or_else(|| Duration::hours(DEFAULT_CACHE_RETENTION_HOURS))
    }

    /// True when the freshness window outlasts physical retention, which
    /// silently shortens the effective TTL to the retention ceiling.
    pub fn ttl_exceeds_retention(&self) -> bool {
        self.cache_ttl() > self.cache_retention()
    }

    pub fn upstream_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.upstream_timeout_secs)
    }

    pub fn token_lifetime(&self) -> Duration {
        positive(Duration::try_hours(self.token_lifetime_hours))
            .unwrap_or_else(|| Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS))
    }

    pub fn rate_limit_window(&self) -> StdDuration {
        StdDuration::from_millis(self.rate_limit_window_ms.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: DEFAULT_CACHE_TTL_MINUTES,
            cache_retention_hours: DEFAULT_CACHE_RETENTION_HOURS,
            history_page_max_limit: 100,
            server_port: 3000,
            cleanup_interval: 60,
            upstream_timeout_secs: 10,
            openweather_api_key: None,
            openweather_base_url: DEFAULT_OPENWEATHER_BASE_URL.to_string(),
            token_lifetime_hours: DEFAULT_TOKEN_LIFETIME_HOURS,
            rate_limit_window_ms: 60_000,
            rate_limit_max_requests: 60,
        }
    }
}

fn positive(duration: Option<Duration>) -> Option<Duration> {
    duration.filter(|d| *d > Duration::zero())
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
