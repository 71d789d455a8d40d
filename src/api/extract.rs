//! Request extractors
//!
//! Token signatures are verified upstream by the auth gateway, which forwards
//! the raw bearer token together with the resolved identity. This extractor
//! only has to refuse tokens that have since been signed out.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::api::AppState;
use crate::auth::UserId;
use crate::error::LedgerError;

/// Header carrying the authenticated caller's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the token's natural expiry (RFC 3339).
pub const TOKEN_EXPIRES_HEADER: &str = "x-token-expires-at";

/// Caller identity resolved from the request headers.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    /// Raw bearer token; also the revocation key
    pub token_id: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthenticatedUser {
    /// Parses credentials without consulting the revocation list.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, LedgerError> {
        let token_id = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| LedgerError::Unauthorized("Missing or invalid bearer token".into()))?;

        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| LedgerError::Unauthorized("Missing user identity".into()))?;

        let expires_at = match headers.get(TOKEN_EXPIRES_HEADER) {
            Some(raw) => {
                let parsed = raw
                    .to_str()
                    .ok()
                    .and_then(|v| DateTime::parse_from_rfc3339(v.trim()).ok())
                    .ok_or_else(|| LedgerError::Unauthorized("Invalid token expiry".into()))?;
                Some(parsed.with_timezone(&Utc))
            }
            None => None,
        };

        Ok(Self {
            user_id: UserId::new(user_id),
            token_id: token_id.to_string(),
            expires_at,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = LedgerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = Self::from_headers(&parts.headers)?;

        if state.revocations.is_revoked(&user.token_id, Utc::now()).await? {
            debug!(user_id = %user.user_id, "rejected revoked token");
            return Err(LedgerError::TokenRevoked);
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_parses_full_credentials() {
        let user = AuthenticatedUser::from_headers(&headers(&[
            ("authorization", "Bearer abc.def"),
            (USER_ID_HEADER, "user-7"),
            (TOKEN_EXPIRES_HEADER, "2030-01-01T00:00:00Z"),
        ]))
        .unwrap();

        assert_eq!(user.token_id, "abc.def");
        assert_eq!(user.user_id, UserId::new("user-7"));
        assert_eq!(user.expires_at.unwrap().to_rfc3339(), "2030-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_expiry_is_optional() {
        let user = AuthenticatedUser::from_headers(&headers(&[
            ("authorization", "Bearer t"),
            (USER_ID_HEADER, "u"),
        ]))
        .unwrap();
        assert!(user.expires_at.is_none());
    }

    #[test]
    fn test_rejects_missing_pieces() {
        let cases = [
            headers(&[(USER_ID_HEADER, "u")]),
            headers(&[("authorization", "Basic dTpw"), (USER_ID_HEADER, "u")]),
            headers(&[("authorization", "Bearer "), (USER_ID_HEADER, "u")]),
            headers(&[("authorization", "Bearer t")]),
            headers(&[
                ("authorization", "Bearer t"),
                (USER_ID_HEADER, "u"),
                (TOKEN_EXPIRES_HEADER, "tomorrow"),
            ]),
        ];
        for case in cases {
            let err = AuthenticatedUser::from_headers(&case).unwrap_err();
            assert_eq!(err.code(), "MISSING_TOKEN");
        }
    }
}
