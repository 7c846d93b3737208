#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use axum_extra::extract::CookieJar;
use cookie::Cookie;
use idp_session::middleware::{
    BoxError, CredentialRevoker, IdentityVerifier, MemorySessionStore, SessionStore,
};
use idp_session::{IdentityCredential, Session, SubjectId, VerificationFailure};

/// Identity provider double: knows a fixed credential → subject table.
#[derive(Default)]
pub struct FakeProvider {
    subjects: HashMap<String, String>,
    fail_revocation: bool,
    hang_revocation: bool,
    revoked: Mutex<Vec<SubjectId>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(mut self, credential: &str, subject: &str) -> Self {
        self.subjects.insert(credential.into(), subject.into());
        self
    }

    pub fn failing_revocation(mut self) -> Self {
        self.fail_revocation = true;
        self
    }

    pub fn hanging_revocation(mut self) -> Self {
        self.hang_revocation = true;
        self
    }

    pub fn revoked(&self) -> Vec<SubjectId> {
        self.revoked.lock().unwrap().clone()
    }
}

impl IdentityVerifier for FakeProvider {
    async fn verify(
        &self,
        credential: &IdentityCredential,
    ) -> Result<SubjectId, VerificationFailure> {
        self.subjects
            .get(credential.as_str())
            .map(|s| SubjectId::from(s.as_str()))
            .ok_or(VerificationFailure::Expired)
    }
}

impl CredentialRevoker for FakeProvider {
    async fn revoke_all(&self, subject: &SubjectId) -> Result<(), BoxError> {
        if self.hang_revocation {
            std::future::pending::<()>().await;
        }
        if self.fail_revocation {
            return Err("provider unreachable".into());
        }
        self.revoked.lock().unwrap().push(subject.clone());
        Ok(())
    }
}

/// Store whose backend is always down.
pub struct UnreachableStore;

impl SessionStore for UnreachableStore {
    fn cookie_name(&self) -> &str {
        "__session"
    }

    async fn load(&self, _cookie: Option<&str>) -> Result<Session, BoxError> {
        Err("connection refused".into())
    }

    async fn commit(&self, _session: &Session) -> Result<String, BoxError> {
        Err("connection refused".into())
    }

    async fn destroy(&self, _session: &Session) -> Result<(), BoxError> {
        Err("connection refused".into())
    }
}

/// Commit a session holding `csrf` and, optionally, `credential`.
///
/// Returns the stored session and a request jar carrying its cookie.
pub async fn seed_session(
    store: &MemorySessionStore,
    credential: Option<&str>,
) -> (Session, CookieJar) {
    let mut session = store.load(None).await.unwrap();
    session.set_csrf_token("tok".into());
    if let Some(credential) = credential {
        session.set_identity_credential(credential.into());
    }
    let value = store.commit(&session).await.unwrap();
    let jar = CookieJar::new().add(Cookie::new(store.cookie_name().to_owned(), value));
    (session, jar)
}
