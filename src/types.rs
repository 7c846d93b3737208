use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Canonical identity of a verified credential holder (the `sub` claim).
///
/// Only ever produced by a successful verification. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct SubjectId(pub String);

impl SubjectId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SubjectId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Opaque credential minted by the identity provider and carried in the session.
///
/// Holding one proves nothing; it must pass an
/// [`IdentityVerifier`](crate::middleware::IdentityVerifier) first.
/// `Debug` is redacted so the bearer value never reaches logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, From, Into)]
#[serde(transparent)]
pub struct IdentityCredential(String);

impl IdentityCredential {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for IdentityCredential {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl std::fmt::Debug for IdentityCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("IdentityCredential(<redacted>)")
    }
}

/// Anti-forgery nonce bound to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct CsrfToken(String);

impl CsrfToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CsrfToken {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Server-side record key for keyed session stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into)]
pub struct SessionKey(pub Ulid);

impl SessionKey {
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// Parses the textual form written into the session cookie.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Ulid::from_string(s).ok().map(Self)
    }
}
