//! Upstream fetcher contract.

use async_trait::async_trait;
use thiserror::Error;

use crate::weather::{CoordinateKey, WeatherPayload};

/// Failure modes of an upstream weather call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transient or server-side failure; retryable by the caller
    #[error("weather service temporarily unavailable: {0}")]
    Unavailable(String),

    /// No credentials or endpoint configured
    #[error("weather service misconfigured: {0}")]
    Misconfigured(String),

    /// Any other non-success response
    #[error("weather API error: {0}")]
    UpstreamError(String),
}

/// Source of current conditions for a normalized coordinate.
///
/// Implementations never retry; each call is bounded by the implementation's
/// own timeout.
#[async_trait]
pub trait UpstreamFetcher: Send + Sync {
    /// Label recorded as the response `source` on a cache miss.
    fn name(&self) -> &str;

    async fn fetch(&self, key: CoordinateKey) -> Result<WeatherPayload, FetchError>;
}
