#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Identity provider {operation} failed (status {status:?}): {detail}")]
    Provider {
        operation: &'static str,
        status: Option<u16>,
        detail: String,
    },
    #[cfg(feature = "provider")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Token error: {0}")]
    Token(String),
    #[error("Session codec error: {0}")]
    Codec(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Why an identity credential was rejected.
///
/// Every variant means "not authenticated" to the caller. The kind exists for
/// logs only and never grants partial trust.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationFailure {
    /// Undecodable, badly signed, or missing a required claim.
    #[error("malformed credential: {0}")]
    Malformed(String),
    #[error("credential expired")]
    Expired,
    /// Issued before the subject's revocation watermark, or the subject is disabled.
    #[error("credential revoked")]
    Revoked,
    /// `iss` or `aud` does not name the trusted issuer.
    #[error("issuer mismatch: {0}")]
    IssuerMismatch(String),
    /// Revocation status could not be confirmed with the provider.
    #[error("revocation status unavailable: {0}")]
    Unavailable(String),
}

impl VerificationFailure {
    /// Short label for structured logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
            Self::IssuerMismatch(_) => "issuer_mismatch",
            Self::Unavailable(_) => "unavailable",
        }
    }
}
