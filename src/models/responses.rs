//! Response DTOs for the weather ledger API
//!
//! Every successful body is wrapped in the same `{success, data}` envelope
//! that failures use with `{success, error}`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::CacheStats;

/// Success envelope shared by all endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Response body for `GET /history?count=true`.
#[derive(Debug, Clone, Serialize)]
pub struct CountResponse {
    pub total: u64,
}

/// Response body for `POST /auth/signout`.
#[derive(Debug, Clone, Serialize)]
pub struct SignOutResponse {
    pub message: String,
}

impl SignOutResponse {
    pub fn signed_out() -> Self {
        Self {
            message: "Successfully signed out".to_string(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Lookups answered from a fresh record
    pub hits: u64,
    /// Lookups that had to go upstream
    pub misses: u64,
    /// Records removed by the cleanup task
    pub purged: u64,
    /// Records currently held, fresh or stale
    pub total_entries: usize,
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            purged: stats.purged,
            total_entries: stats.total_entries,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}
