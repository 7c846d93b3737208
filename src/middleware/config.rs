use cookie::Key;
use time::Duration;

use super::error::AuthError;
use super::store::{CookieSessionStore, MemorySessionStore};
use crate::codec::SessionCodec;

/// Shared settings used by both config and runtime state.
#[derive(Debug, Clone)]
pub(crate) struct AuthSettings {
    pub(crate) session_ttl_days: i64,
    pub(crate) secure_cookies: bool,
    pub(crate) auth_path: String,
    pub(crate) begin_login_redirect: String,
    pub(crate) login_redirect: String,
    pub(crate) logout_redirect: String,
}

impl AuthSettings {
    fn defaults() -> Self {
        Self {
            session_ttl_days: 14,
            secure_cookies: true,
            auth_path: "/auth".into(),
            begin_login_redirect: "/login".into(),
            login_redirect: "/".into(),
            logout_redirect: "/".into(),
        }
    }
}

/// Session lifecycle configuration.
///
/// Use [`from_env()`](SessionAuthConfig::from_env) for convention-based setup,
/// or [`new()`](SessionAuthConfig::new) with `with_*` methods for full control.
pub struct SessionAuthConfig {
    pub(super) cookie_key: Key,
    pub(super) session_cookie_name: String,
    pub(super) settings: AuthSettings,
}

impl SessionAuthConfig {
    /// Create config signing cookies with `cookie_key`.
    ///
    /// All other fields use defaults. Override with `with_*` methods.
    #[must_use]
    pub fn new(cookie_key: Key) -> Self {
        Self {
            cookie_key,
            session_cookie_name: "__session".into(),
            settings: AuthSettings::defaults(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Optional env vars
    /// - `COOKIE_KEY`: cookie signing key bytes (at least 64). Ephemeral key if unset.
    /// - `SESSION_COOKIE_NAME`: session cookie name (default `__session`)
    /// - `SESSION_TTL_DAYS`: session cookie lifetime in days (default 14)
    /// - `DEV_AUTH`: `"1"` or `"true"` to drop the `Secure` cookie attribute
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if a variable is set but invalid.
    pub fn from_env() -> Result<Self, AuthError> {
        let cookie_key = match std::env::var("COOKIE_KEY") {
            Ok(k) => Key::try_from(k.as_bytes()).map_err(|_| {
                AuthError::Config(
                    "COOKIE_KEY is set but invalid (must be at least 64 bytes). \
                     Remove the env var to use an ephemeral key, or provide a valid key."
                        .into(),
                )
            })?,
            Err(_) => {
                tracing::warn!("COOKIE_KEY not set; sessions will not survive a restart");
                Key::generate()
            }
        };

        let mut config = Self::new(cookie_key);

        if let Ok(name) = std::env::var("SESSION_COOKIE_NAME") {
            config = config.with_session_cookie_name(name);
        }
        if let Ok(days) = std::env::var("SESSION_TTL_DAYS") {
            let days: i64 = days
                .parse()
                .map_err(|e| AuthError::Config(format!("SESSION_TTL_DAYS: {e}")))?;
            config = config.with_session_ttl_days(days);
        }

        let dev_auth = matches!(
            std::env::var("DEV_AUTH").as_deref(),
            Ok("1") | Ok("true"),
        );

        Ok(config.with_secure_cookies(!dev_auth))
    }

    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.cookie_key = key;
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.session_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_session_ttl_days(mut self, days: i64) -> Self {
        self.settings.session_ttl_days = days;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn with_auth_path(mut self, path: impl Into<String>) -> Self {
        self.settings.auth_path = path.into();
        self
    }

    /// Where the CSRF-issuing action sends the browser (default `/login`).
    #[must_use]
    pub fn with_begin_login_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.begin_login_redirect = path.into();
        self
    }

    #[must_use]
    pub fn with_login_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.login_redirect = path.into();
        self
    }

    #[must_use]
    pub fn with_logout_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.logout_redirect = path.into();
        self
    }

    /// Codec signing values for the configured session cookie.
    #[must_use]
    pub fn codec(&self) -> SessionCodec {
        SessionCodec::new(self.cookie_key.clone(), self.session_cookie_name.clone())
    }

    /// Store keeping the whole session inside the signed cookie.
    #[must_use]
    pub fn cookie_store(&self) -> CookieSessionStore {
        CookieSessionStore::new(self.codec())
    }

    /// Store keeping sessions in process memory, keyed by a signed cookie.
    ///
    /// Records expire with the session cookie.
    #[must_use]
    pub fn memory_store(&self) -> MemorySessionStore {
        MemorySessionStore::new(self.codec())
            .with_ttl(Duration::days(self.settings.session_ttl_days))
    }
}
