use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

use crate::csrf::CsrfRejection;
use crate::error::VerificationFailure;

/// Landing page for requests that turn out to be unauthenticated.
const ANONYMOUS_LANDING: &str = "/";

/// Session lifecycle errors surfaced to the HTTP layer.
///
/// None of these leaves a partially committed session behind: every handler
/// returns before touching the response cookie when one occurs.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The operation needs an identity credential and the session has none.
    #[error("No identity credential in session")]
    MissingCredential,

    /// The credential could not be verified. Treated as "not authenticated".
    #[error("Credential verification failed: {0}")]
    Verification(#[from] VerificationFailure),

    /// The provider did not confirm revocation. The local session is kept.
    #[error("Credential revocation failed: {0}")]
    Revocation(String),

    /// Session store operation failed.
    #[error("Session store error: {0}")]
    Store(String),

    /// Anti-forgery check failed on a mutating request.
    #[error("CSRF check failed: {0}")]
    Csrf(#[from] CsrfRejection),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingCredential => Redirect::to(ANONYMOUS_LANDING).into_response(),
            Self::Verification(ref failure) => {
                tracing::warn!(kind = failure.kind(), error = %failure, "Credential rejected");
                Redirect::to(ANONYMOUS_LANDING).into_response()
            }
            Self::Csrf(ref rejection) => {
                tracing::warn!(error = %rejection, "CSRF check failed");
                (StatusCode::FORBIDDEN, self.to_string()).into_response()
            }
            Self::Revocation(_) => {
                tracing::error!(error = %self, "Logout aborted");
                (StatusCode::BAD_GATEWAY, "Logout failed, please retry").into_response()
            }
            Self::Store(_) | Self::Config(_) => {
                tracing::error!(error = %self, "Session internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}
