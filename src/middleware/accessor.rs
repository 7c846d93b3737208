use axum_extra::extract::CookieJar;

use super::cookies;
use super::error::AuthError;
use super::traits::SessionStore;
use crate::session::Session;
use crate::types::{CsrfToken, IdentityCredential};

/// Session data for a single request.
///
/// `is_authenticated` reflects credential presence only. Anything that grants
/// access must verify `identity_credential` first.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session: Session,
    pub csrf_token: Option<CsrfToken>,
    pub identity_credential: Option<IdentityCredential>,
}

impl SessionContext {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity_credential.is_some()
    }
}

/// Load the request's session and pull out its CSRF token and credential.
///
/// A missing or invalid cookie yields a fresh session. Nothing is committed;
/// the caller decides whether to send a cookie back.
///
/// # Errors
///
/// - [`AuthError::MissingCredential`] if `require_credential` is set and the
///   session carries no credential.
/// - [`AuthError::Store`] if the store is unreachable.
pub async fn get_session_data<S: SessionStore>(
    store: &S,
    jar: &CookieJar,
    require_credential: bool,
) -> Result<SessionContext, AuthError> {
    let cookie = cookies::session_value(jar, store.cookie_name());
    let session = store
        .load(cookie.as_deref())
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

    let identity_credential = session.identity_credential().cloned();
    if require_credential && identity_credential.is_none() {
        return Err(AuthError::MissingCredential);
    }

    Ok(SessionContext {
        csrf_token: session.csrf_token().cloned(),
        identity_credential,
        session,
    })
}
