use std::future::Future;
use std::sync::Arc;

use crate::error::VerificationFailure;
use crate::session::Session;
use crate::types::{IdentityCredential, SubjectId};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Session persistence addressed by a signed cookie value.
///
/// The store owns the cookie name and the signing key. Callers hand it the
/// raw cookie value from the request and get back the value to set on the
/// response; cookie attributes are applied by the router.
///
/// # Example
///
/// ```rust,ignore
/// impl SessionStore for RedisStore {
///     fn cookie_name(&self) -> &str { "__session" }
///
///     async fn load(&self, cookie: Option<&str>) -> Result<Session, BoxError> {
///         let Some(key) = cookie.and_then(|c| self.codec.verify(c)) else {
///             return Ok(Session::new());
///         };
///         Ok(self.redis.get(&key).await?.unwrap_or_default())
///     }
///     // ...
/// }
/// ```
pub trait SessionStore: Send + Sync + 'static {
    /// Name of the cookie carrying the session reference.
    fn cookie_name(&self) -> &str;

    /// Load the session referenced by `cookie`.
    ///
    /// Absent, unsigned, or unknown cookies yield a fresh empty session.
    /// `Err` is reserved for store I/O failure.
    fn load(
        &self,
        cookie: Option<&str>,
    ) -> impl Future<Output = Result<Session, BoxError>> + Send;

    /// Persist the session. Returns the signed cookie value to send back.
    fn commit(&self, session: &Session) -> impl Future<Output = Result<String, BoxError>> + Send;

    /// Destroy the session record (logout).
    fn destroy(&self, session: &Session) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Verifies identity credentials against the trusted issuer.
pub trait IdentityVerifier: Send + Sync + 'static {
    /// Return the canonical subject, or why the credential can't be trusted.
    fn verify(
        &self,
        credential: &IdentityCredential,
    ) -> impl Future<Output = Result<SubjectId, VerificationFailure>> + Send;
}

/// Revokes refresh-capable credentials at the identity provider.
pub trait CredentialRevoker: Send + Sync + 'static {
    /// Revoke every refresh credential held by `subject`.
    ///
    /// Must be idempotent: revoking an already-revoked subject is `Ok`.
    fn revoke_all(&self, subject: &SubjectId) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Everything the logout path needs from the provider.
pub trait IdentityProvider: IdentityVerifier + CredentialRevoker {}

impl<T: IdentityVerifier + CredentialRevoker> IdentityProvider for T {}

impl<T: SessionStore> SessionStore for Arc<T> {
    fn cookie_name(&self) -> &str {
        (**self).cookie_name()
    }

    fn load(
        &self,
        cookie: Option<&str>,
    ) -> impl Future<Output = Result<Session, BoxError>> + Send {
        (**self).load(cookie)
    }

    fn commit(&self, session: &Session) -> impl Future<Output = Result<String, BoxError>> + Send {
        (**self).commit(session)
    }

    fn destroy(&self, session: &Session) -> impl Future<Output = Result<(), BoxError>> + Send {
        (**self).destroy(session)
    }
}

impl<T: IdentityVerifier> IdentityVerifier for Arc<T> {
    fn verify(
        &self,
        credential: &IdentityCredential,
    ) -> impl Future<Output = Result<SubjectId, VerificationFailure>> + Send {
        (**self).verify(credential)
    }
}

impl<T: CredentialRevoker> CredentialRevoker for Arc<T> {
    fn revoke_all(&self, subject: &SubjectId) -> impl Future<Output = Result<(), BoxError>> + Send {
        (**self).revoke_all(subject)
    }
}
