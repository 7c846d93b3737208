use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use subtle::ConstantTimeEq;

use crate::session::{AuthenticationState, Session};
use crate::types::CsrfToken;

/// Form field a mutating request uses to echo the session token.
pub const CSRF_FORM_FIELD: &str = "csrf";

/// Header alternative to [`CSRF_FORM_FIELD`] for script-driven requests.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Why a mutating request failed the anti-forgery check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CsrfRejection {
    #[error("session holds no CSRF token")]
    MissingSessionToken,
    #[error("request did not present a CSRF token")]
    MissingRequestToken,
    #[error("CSRF token mismatch")]
    Mismatch,
}

/// Generates a cryptographically random anti-forgery token.
///
/// Returns a 43-character URL-safe string (32 random bytes → base64url).
#[must_use]
pub fn generate_token() -> CsrfToken {
    let random_bytes: [u8; 32] = rand::rng().random();
    CsrfToken::from(URL_SAFE_NO_PAD.encode(random_bytes))
}

/// Issuance policy: only anonymous responses get a token.
///
/// Anonymous responses stay byte-identical across users until a token is
/// minted, which keeps them eligible for a shared cache. Identified sessions
/// are never publicly cacheable and keep whatever token they already hold.
#[must_use]
pub fn should_issue(state: AuthenticationState) -> bool {
    matches!(state, AuthenticationState::Anonymous)
}

/// Mint a token into an anonymous session that has none yet.
///
/// Identified sessions and sessions already holding a token come back
/// unchanged. Nothing is persisted here; the caller commits.
#[must_use]
pub fn issue_if_anonymous(mut session: Session) -> Session {
    if should_issue(session.authentication_state()) && session.csrf_token().is_none() {
        session.set_csrf_token(generate_token());
    }
    session
}

/// Check the token presented by a mutating request against the session.
///
/// # Errors
///
/// Returns a [`CsrfRejection`] if either side is missing or the values differ.
pub fn verify_token(session: &Session, presented: Option<&str>) -> Result<(), CsrfRejection> {
    let expected = session
        .csrf_token()
        .ok_or(CsrfRejection::MissingSessionToken)?;
    let presented = presented
        .filter(|p| !p.is_empty())
        .ok_or(CsrfRejection::MissingRequestToken)?;

    if bool::from(expected.as_str().as_bytes().ct_eq(presented.as_bytes())) {
        Ok(())
    } else {
        Err(CsrfRejection::Mismatch)
    }
}
