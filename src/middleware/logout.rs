use axum::response::Redirect;
use axum_extra::extract::CookieJar;

use super::accessor::{SessionContext, get_session_data};
use super::cookies;
use super::error::AuthError;
use super::traits::{IdentityProvider, SessionStore};

/// Log the request's session out everywhere.
///
/// Steps run strictly in order and stop at the first failure:
///
/// 1. load the session (needs a credential, else [`AuthError::MissingCredential`])
/// 2. verify the credential ([`AuthError::Verification`])
/// 3. revoke the subject's refresh credentials at the provider ([`AuthError::Revocation`])
/// 4. destroy the local session record ([`AuthError::Store`])
/// 5. return a clearing cookie and a redirect to `logout_redirect`
///
/// The local record is only destroyed once the provider confirmed revocation.
/// If revocation fails, or the request is dropped before it completes, the
/// session stays as it was and the whole logout can be retried.
///
/// # Errors
///
/// See the steps above. No error leaves the session partially torn down.
pub async fn revoke<S, P>(
    store: &S,
    provider: &P,
    jar: CookieJar,
    logout_redirect: &str,
    secure_cookies: bool,
) -> Result<(CookieJar, Redirect), AuthError>
where
    S: SessionStore,
    P: IdentityProvider,
{
    let ctx = get_session_data(store, &jar, true).await?;
    end_session(store, provider, ctx, jar, logout_redirect, secure_cookies).await
}

/// Steps 2–5 of [`revoke`], for callers that already loaded the session.
pub(super) async fn end_session<S, P>(
    store: &S,
    provider: &P,
    ctx: SessionContext,
    jar: CookieJar,
    logout_redirect: &str,
    secure_cookies: bool,
) -> Result<(CookieJar, Redirect), AuthError>
where
    S: SessionStore,
    P: IdentityProvider,
{
    let credential = ctx
        .identity_credential
        .as_ref()
        .ok_or(AuthError::MissingCredential)?;

    let subject = provider.verify(credential).await?;

    provider.revoke_all(&subject).await.map_err(|e| {
        tracing::error!(subject = %subject, error = %e, "Refresh token revocation failed");
        AuthError::Revocation(e.to_string())
    })?;

    store
        .destroy(&ctx.session)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

    tracing::info!(subject = %subject, "Session revoked");

    let clear_cookie = cookies::clear_session_cookie(store.cookie_name(), secure_cookies);
    Ok((jar.add(clear_cookie), Redirect::to(logout_redirect)))
}
