use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::header::CACHE_CONTROL;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use super::accessor::{SessionContext, get_session_data};
use super::config::{AuthSettings, SessionAuthConfig};
use super::cookies;
use super::error::AuthError;
use super::logout;
use super::state::AuthState;
use super::traits::{IdentityProvider, SessionStore};
use crate::csrf::{self, CSRF_HEADER};
use crate::session::Session;
use crate::types::IdentityCredential;

/// Create the session lifecycle router.
///
/// Routes, relative to the configured auth path (default `/auth`):
///
/// - `GET  /session`: session probe; mints a CSRF token for anonymous sessions
/// - `POST /csrf`   : mint a CSRF token, then redirect to the login page
/// - `POST /login`  : store a verified identity credential in the session
/// - `GET  /logout` : redirect only, no side effects
/// - `POST /logout` : revoke the subject's credentials and end the session
pub fn session_routes<S, P>(config: SessionAuthConfig, store: S, provider: P) -> Router
where
    S: SessionStore,
    P: IdentityProvider,
{
    let auth_path = config.settings.auth_path.trim_end_matches('/').to_string();

    let state = AuthState {
        store: Arc::new(store),
        provider: Arc::new(provider),
        settings: config.settings,
    };

    Router::new()
        .route(&format!("{auth_path}/session"), get(session_probe::<S, P>))
        .route(&format!("{auth_path}/csrf"), post(begin_login::<S, P>))
        .route(&format!("{auth_path}/login"), post(login::<S, P>))
        .route(
            &format!("{auth_path}/logout"),
            get(logout_landing::<S, P>).post(logout::<S, P>),
        )
        .with_state(state)
}

// ── Session probe ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct SessionProbe {
    csrf: Option<String>,
    is_logged_in: bool,
}

async fn session_probe<S: SessionStore, P: IdentityProvider>(
    State(state): State<AuthState<S, P>>,
    jar: CookieJar,
) -> Result<Response, AuthError> {
    let SessionContext {
        session,
        csrf_token,
        identity_credential,
    } = get_session_data(&*state.store, &jar, false).await?;

    let session = csrf::issue_if_anonymous(session);
    let minted = csrf_token.is_none() && session.csrf_token().is_some();

    let jar = if minted {
        commit(&*state.store, &state.settings, jar, &session).await?
    } else {
        jar
    };

    let probe = SessionProbe {
        csrf: session.csrf_token().map(ToString::to_string),
        is_logged_in: identity_credential.is_some(),
    };

    let mut response = (jar, Json(probe)).into_response();
    if minted {
        response
            .headers_mut()
            .insert(CACHE_CONTROL, HeaderValue::from_static("private, no-store"));
    }
    Ok(response)
}

// ── Begin login ────────────────────────────────────────────────────

async fn begin_login<S: SessionStore, P: IdentityProvider>(
    State(state): State<AuthState<S, P>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AuthError> {
    let ctx = get_session_data(&*state.store, &jar, false).await?;
    let session = csrf::issue_if_anonymous(ctx.session);
    let jar = commit(&*state.store, &state.settings, jar, &session).await?;
    Ok((jar, Redirect::to(&state.settings.begin_login_redirect)))
}

// ── Login ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginForm {
    id_token: String,
    #[serde(default)]
    csrf: Option<String>,
}

async fn login<S: SessionStore, P: IdentityProvider>(
    State(state): State<AuthState<S, P>>,
    jar: CookieJar,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), AuthError> {
    let ctx = get_session_data(&*state.store, &jar, false).await?;
    let presented = presented_token(&headers, form.csrf);
    csrf::verify_token(&ctx.session, presented.as_deref())?;

    let credential = IdentityCredential::from(form.id_token);
    let subject = state.provider.verify(&credential).await?;

    let previous = ctx.session;
    let mut session = previous.clone();
    session.renew_key();
    session.set_identity_credential(credential);

    let jar = commit(&*state.store, &state.settings, jar, &session).await?;

    // A record left behind here still expires with its TTL.
    if previous.key() != session.key() {
        if let Err(e) = state.store.destroy(&previous).await {
            tracing::warn!(error = %e, "Pre-login session cleanup failed");
        }
    }

    tracing::info!(subject = %subject, "Session established");

    Ok((jar, Redirect::to(&state.settings.login_redirect)))
}

// ── Logout ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CsrfForm {
    #[serde(default)]
    csrf: Option<String>,
}

async fn logout_landing<S: SessionStore, P: IdentityProvider>(
    State(state): State<AuthState<S, P>>,
) -> Redirect {
    Redirect::to(&state.settings.logout_redirect)
}

async fn logout<S: SessionStore, P: IdentityProvider>(
    State(state): State<AuthState<S, P>>,
    jar: CookieJar,
    headers: HeaderMap,
    form: Result<Form<CsrfForm>, FormRejection>,
) -> Result<(CookieJar, Redirect), AuthError> {
    let ctx = get_session_data(&*state.store, &jar, true).await?;
    let form_token = form.ok().and_then(|Form(f)| f.csrf);
    let presented = presented_token(&headers, form_token);
    csrf::verify_token(&ctx.session, presented.as_deref())?;

    logout::end_session(
        &*state.store,
        &*state.provider,
        ctx,
        jar,
        &state.settings.logout_redirect,
        state.settings.secure_cookies,
    )
    .await
}

// ── Helpers ────────────────────────────────────────────────────────

async fn commit<S: SessionStore>(
    store: &S,
    settings: &AuthSettings,
    jar: CookieJar,
    session: &Session,
) -> Result<CookieJar, AuthError> {
    let value = store
        .commit(session)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;
    let cookie = cookies::session_cookie(
        store.cookie_name(),
        &value,
        settings.session_ttl_days,
        settings.secure_cookies,
    );
    Ok(jar.add(cookie))
}

/// Header wins over the form field when both are present.
fn presented_token(headers: &HeaderMap, form_value: Option<String>) -> Option<String> {
    headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .or(form_value)
}
