use std::sync::{Arc, OnceLock};

use serde::Deserialize;
use time::OffsetDateTime;
use url::Url;

use crate::error::{Error, VerificationFailure};
use crate::middleware::{BoxError, CredentialRevoker, IdentityVerifier};
use crate::token::{self, PublicKey};
use crate::types::{IdentityCredential, SubjectId};

/// Identity provider settings.
///
/// Issuer, audience, key and API URL are mandatory. Revocation checking is on
/// unless explicitly disabled.
#[derive(Clone)]
#[non_exhaustive]
pub struct ProviderConfig {
    pub(crate) issuer: String,
    pub(crate) audience: String,
    pub(crate) public_key: PublicKey,
    pub(crate) api_url: Url,
    pub(crate) service_token: Option<String>,
    pub(crate) check_revoked: bool,
}

impl ProviderConfig {
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        public_key: PublicKey,
        api_url: Url,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            public_key,
            api_url,
            service_token: None,
            check_revoked: true,
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `IDP_ISSUER`: expected `iss` claim
    /// - `IDP_AUDIENCE`: expected `aud` claim
    /// - `IDP_PUBLIC_KEY`: hex-encoded Ed25519 public key of the issuer
    /// - `IDP_API_URL`: base URL of the provider's admin API
    ///
    /// # Optional env vars
    /// - `IDP_SERVICE_TOKEN`: bearer token for admin API calls
    /// - `IDP_CHECK_REVOKED`: `"0"` or `"false"` to skip the per-verification revocation lookup
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if required env vars are missing or malformed.
    pub fn from_env() -> Result<Self, Error> {
        let issuer = required_env("IDP_ISSUER")?;
        let audience = required_env("IDP_AUDIENCE")?;
        let public_key = token::parse_public_key_hex(&required_env("IDP_PUBLIC_KEY")?)
            .map_err(|e| Error::Config(format!("IDP_PUBLIC_KEY: {e}")))?;
        let api_url: Url = required_env("IDP_API_URL")?
            .parse()
            .map_err(|e| Error::Config(format!("IDP_API_URL: {e}")))?;

        let mut config = Self::new(issuer, audience, public_key, api_url);
        if let Ok(token) = std::env::var("IDP_SERVICE_TOKEN") {
            config = config.with_service_token(token);
        }
        let skip_revocation_check = matches!(
            std::env::var("IDP_CHECK_REVOKED").as_deref(),
            Ok("0") | Ok("false"),
        );
        if skip_revocation_check {
            tracing::warn!("IDP_CHECK_REVOKED disabled; revoked credentials verify until they expire");
        }
        Ok(config.with_check_revoked(!skip_revocation_check))
    }

    #[must_use]
    pub fn with_service_token(mut self, token: impl Into<String>) -> Self {
        self.service_token = Some(token.into());
        self
    }

    /// Whether every verification asks the provider if the subject's
    /// credentials were revoked (one extra round trip). On by default.
    ///
    /// With `false`, a revoked credential keeps verifying until its `exp`.
    #[must_use]
    pub fn with_check_revoked(mut self, enabled: bool) -> Self {
        self.check_revoked = enabled;
        self
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    #[must_use]
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("public_key", &self.public_key)
            .field("api_url", &self.api_url.as_str())
            .field("service_token", &self.service_token.as_ref().map(|_| "<redacted>"))
            .field("check_revoked", &self.check_revoked)
            .finish()
    }
}

fn required_env(name: &str) -> Result<String, Error> {
    std::env::var(name).map_err(|_| Error::Config(format!("{name} is required")))
}

/// Subject account state as reported by the provider.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct SubjectAccount {
    pub sub: SubjectId,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub tokens_valid_after: Option<OffsetDateTime>,
    #[serde(default)]
    pub disabled: bool,
}

/// Client for the trusted identity provider.
///
/// Verifies session credentials locally against the issuer key and calls the
/// provider's admin API for revocation.
pub struct IdentityProviderClient {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl IdentityProviderClient {
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Verify a session credential and return its subject.
    ///
    /// # Errors
    ///
    /// Any [`VerificationFailure`]; there are no retries.
    pub async fn verify_session_credential(
        &self,
        credential: &str,
    ) -> Result<SubjectId, VerificationFailure> {
        let verified = token::verify_credential(
            &self.config.public_key,
            credential,
            &self.config.issuer,
            &self.config.audience,
            OffsetDateTime::now_utc(),
        )?;

        if self.config.check_revoked {
            let account = self
                .get_subject(&verified.subject)
                .await
                .map_err(|e| VerificationFailure::Unavailable(e.to_string()))?;
            if account.disabled {
                return Err(VerificationFailure::Revoked);
            }
            if let Some(valid_after) = account.tokens_valid_after {
                match verified.issued_at {
                    Some(issued_at) if issued_at >= valid_after => {}
                    _ => return Err(VerificationFailure::Revoked),
                }
            }
        }

        Ok(verified.subject)
    }

    /// Revoke every refresh credential held by `subject`.
    ///
    /// Idempotent at the provider: revoking an already-revoked subject succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or
    /// [`Error::Provider`] if the provider rejects the request.
    pub async fn revoke_refresh_tokens(&self, subject: &SubjectId) -> Result<(), Error> {
        let url = self.subject_endpoint(subject, Some("revoke-refresh-tokens"))?;
        let response = self.authorized(self.http.post(url)).send().await?;
        Self::ensure_success(response, "refresh token revocation").await?;
        Ok(())
    }

    /// Fetch the subject's account state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or
    /// [`Error::Provider`] if the provider returns an error.
    pub async fn get_subject(&self, subject: &SubjectId) -> Result<SubjectAccount, Error> {
        let url = self.subject_endpoint(subject, None)?;
        let response = self.authorized(self.http.get(url)).send().await?;
        let response = Self::ensure_success(response, "subject lookup").await?;
        response.json::<SubjectAccount>().await.map_err(Into::into)
    }

    fn subject_endpoint(&self, subject: &SubjectId, action: Option<&str>) -> Result<Url, Error> {
        let base = self.config.api_url.as_str().trim_end_matches('/');
        let subject = urlencoding::encode(subject.as_str());
        let url = match action {
            Some(action) => format!("{base}/v1/subjects/{subject}/{action}"),
            None => format!("{base}/v1/subjects/{subject}"),
        };
        Ok(url.parse()?)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.service_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(Error::Provider {
            operation,
            status: Some(status),
            detail: body,
        })
    }
}

impl IdentityVerifier for IdentityProviderClient {
    async fn verify(
        &self,
        credential: &IdentityCredential,
    ) -> Result<SubjectId, VerificationFailure> {
        self.verify_session_credential(credential.as_str()).await
    }
}

impl CredentialRevoker for IdentityProviderClient {
    async fn revoke_all(&self, subject: &SubjectId) -> Result<(), BoxError> {
        self.revoke_refresh_tokens(subject).await.map_err(Into::into)
    }
}

static PROVIDER: OnceLock<Arc<IdentityProviderClient>> = OnceLock::new();

/// Initialize the process-wide provider client.
///
/// Only the first call constructs a client; later calls return that client
/// and ignore their `config`.
pub fn init_provider(config: ProviderConfig) -> Arc<IdentityProviderClient> {
    if let Some(existing) = PROVIDER.get() {
        tracing::debug!("Identity provider already initialized");
        return existing.clone();
    }
    PROVIDER
        .get_or_init(|| {
            tracing::info!(issuer = %config.issuer, "Identity provider initialized");
            Arc::new(IdentityProviderClient::new(config))
        })
        .clone()
}

/// The process-wide provider client, if [`init_provider`] has run.
#[must_use]
pub fn global_provider() -> Option<Arc<IdentityProviderClient>> {
    PROVIDER.get().cloned()
}
