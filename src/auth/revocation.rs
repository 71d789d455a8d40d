//! Revoked token storage.
//!
//! A revocation lives exactly as long as the token it revokes: once the
//! token's natural expiry passes, the entry is ignored and eventually purged.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::auth::UserId;
use crate::error::Result;
use crate::store::TtlStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokedToken {
    pub token_id: String,
    pub user_id: UserId,
    pub revoked_at: DateTime<Utc>,
    /// The token's own expiry
    pub expires_at: DateTime<Utc>,
}

/// Storage contract for signed-out tokens.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Records a sign-out. Revoking an already revoked token is a no-op.
    async fn revoke(
        &self,
        token_id: &str,
        user_id: &UserId,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()>;

    /// True iff a revocation exists with `expires_at > now`.
    async fn is_revoked(&self, token_id: &str, now: DateTime<Utc>) -> Result<bool>;

    /// Physically drops revocations whose token has expired.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}

#[derive(Debug, Default)]
pub struct InMemoryRevocationStore {
    tokens: RwLock<TtlStore<String, RevokedToken>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn revoke(
        &self,
        token_id: &str,
        user_id: &UserId,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if expires_at <= now {
            debug!(%user_id, "token already expired; nothing to revoke");
            return Ok(());
        }

        let token = RevokedToken {
            token_id: token_id.to_string(),
            user_id: user_id.clone(),
            revoked_at: now,
            expires_at,
        };

        let inserted = self
            .tokens
            .write()
            .await
            .put_if_absent(token_id.to_string(), token, now, expires_at);
        if !inserted {
            debug!(%user_id, "token already revoked");
        }
        Ok(())
    }

    async fn is_revoked(&self, token_id: &str, now: DateTime<Utc>) -> Result<bool> {
        let mut tokens = self.tokens.write().await;
        Ok(tokens.get_live(&token_id.to_string(), now).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        Ok(self.tokens.write().await.purge_expired(now).len())
    }
}
