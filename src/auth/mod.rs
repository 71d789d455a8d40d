//! Caller identity and token revocation.
//!
//! Credentials are issued and verified by an external collaborator; this
//! module only models the resolved identity and the sign-out list that the
//! verifier consults.

mod revocation;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use revocation::{InMemoryRevocationStore, RevocationStore, RevokedToken};

/// Identity of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
