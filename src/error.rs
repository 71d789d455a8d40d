//! Error types for the weather ledger
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::weather::FetchError;

// == Ledger Error Enum ==
/// Unified error type for lookups, history queries and revocations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Malformed or out-of-range input; the caller's fault
    #[error("Validation failed: {message}")]
    Validation {
        /// Machine-readable code surfaced to HTTP clients
        code: &'static str,
        message: String,
    },

    /// A referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transient upstream failure, safe to retry at a higher layer
    #[error("Weather service temporarily unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Upstream credentials or endpoint missing; not retryable
    #[error("Weather service misconfigured: {0}")]
    UpstreamMisconfigured(String),

    /// Any other non-success upstream response
    #[error("Weather API error: {0}")]
    Upstream(String),

    /// Persistence layer failure
    #[error("Storage failure: {0}")]
    Storage(String),

    /// Missing or malformed caller credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller presented a token that has been signed out
    #[error("Token has been invalidated. Please sign in again.")]
    TokenRevoked,

    /// Client exceeded its request quota for the current window
    #[error("Too many requests, please try again later")]
    RateLimited {
        /// Seconds until the next request would be admitted
        retry_after_secs: u64,
    },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Builds a validation failure with the given code.
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            code,
            message: message.into(),
        }
    }

    /// Stable error code for response bodies and log correlation.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Validation { code, .. } => code,
            LedgerError::NotFound(_) => "NOT_FOUND",
            LedgerError::UpstreamUnavailable(_) => "SERVICE_UNAVAILABLE",
            LedgerError::UpstreamMisconfigured(_) => "CONFIGURATION_ERROR",
            LedgerError::Upstream(_) => "UPSTREAM_ERROR",
            LedgerError::Storage(_) => "STORAGE_ERROR",
            LedgerError::Unauthorized(_) => "MISSING_TOKEN",
            LedgerError::TokenRevoked => "TOKEN_REVOKED",
            LedgerError::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            LedgerError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::UpstreamUnavailable(_)
                | LedgerError::Storage(_)
                | LedgerError::RateLimited { .. }
        )
    }
}

// == Upstream Conversion ==
impl From<FetchError> for LedgerError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Unavailable(msg) => LedgerError::UpstreamUnavailable(msg),
            FetchError::Misconfigured(msg) => LedgerError::UpstreamMisconfigured(msg),
            FetchError::UpstreamError(msg) => LedgerError::Upstream(msg),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = match &self {
            LedgerError::Validation { .. } => StatusCode::BAD_REQUEST,
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            LedgerError::UpstreamMisconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LedgerError::Upstream(_) => StatusCode::BAD_GATEWAY,
            LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LedgerError::Unauthorized(_) | LedgerError::TokenRevoked => StatusCode::UNAUTHORIZED,
            LedgerError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            LedgerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Storage and internal details stay in the logs
        let message = match &self {
            LedgerError::Storage(_) | LedgerError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                "Internal server error".to_string()
            }
            LedgerError::UpstreamMisconfigured(_) => {
                tracing::error!(error = %self, "upstream misconfigured");
                "Weather service configuration error".to_string()
            }
            LedgerError::Validation { message, .. } => message.clone(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": message,
            }
        }));

        let mut response = (status, body).into_response();
        if let LedgerError::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

// == Result Type Alias ==
/// Convenience Result type for the weather ledger.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_mapping() {
        let err: LedgerError = FetchError::Unavailable("503".into()).into();
        assert!(matches!(err, LedgerError::UpstreamUnavailable(_)));
        assert!(err.is_retryable());

        let err: LedgerError = FetchError::Misconfigured("no key".into()).into();
        assert!(matches!(err, LedgerError::UpstreamMisconfigured(_)));
        assert!(!err.is_retryable());

        let err: LedgerError = FetchError::UpstreamError("401".into()).into();
        assert!(matches!(err, LedgerError::Upstream(_)));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                LedgerError::validation("INVALID_COORDINATES", "bad"),
                StatusCode::BAD_REQUEST,
            ),
            (
                LedgerError::UpstreamUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                LedgerError::UpstreamMisconfigured("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (LedgerError::TokenRevoked, StatusCode::UNAUTHORIZED),
            (LedgerError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                LedgerError::RateLimited { retry_after_secs: 1 },
                StatusCode::TOO_MANY_REQUESTS,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let err = LedgerError::RateLimited { retry_after_secs: 7 };
        assert_eq!(err.code(), "RATE_LIMIT_EXCEEDED");
        assert!(err.is_retryable());

        let response = err.into_response();
        assert_eq!(response.headers()[header::RETRY_AFTER], "7");
    }

    #[test]
    fn test_codes_distinguish_transient_from_fatal() {
        assert_ne!(
            LedgerError::UpstreamUnavailable("x".into()).code(),
            LedgerError::UpstreamMisconfigured("x".into()).code()
        );
    }
}
