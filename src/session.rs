use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{CsrfToken, IdentityCredential, SessionKey};

const RESERVED_FIELDS: [&str; 2] = ["csrf", "idToken"];

/// Whether a session carries an identity credential.
///
/// Presence only: an `Identified` session is not trusted until its credential
/// is verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationState {
    Anonymous,
    Identified,
}

/// The persisted part of a session.
///
/// `extra` holds provider bookkeeping fields and round-trips untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf: Option<CsrfToken>,
    #[serde(default, rename = "idToken", skip_serializing_if = "Option::is_none")]
    pub id_token: Option<IdentityCredential>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A loaded session: its record plus the store key, if the store is keyed.
#[derive(Debug, Clone, Default)]
pub struct Session {
    key: Option<SessionKey>,
    record: SessionRecord,
}

impl Session {
    /// Fresh, empty session with no key.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_record(record: SessionRecord) -> Self {
        Self { key: None, record }
    }

    #[must_use]
    pub fn with_key(key: SessionKey, record: SessionRecord) -> Self {
        Self {
            key: Some(key),
            record,
        }
    }

    #[must_use]
    pub fn key(&self) -> Option<SessionKey> {
        self.key
    }

    /// Replace the store key, if any, with a fresh one.
    ///
    /// Used when privilege changes (login) so a pre-login key can't be replayed.
    pub fn renew_key(&mut self) {
        if self.key.is_some() {
            self.key = Some(SessionKey::generate());
        }
    }

    #[must_use]
    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    #[must_use]
    pub fn csrf_token(&self) -> Option<&CsrfToken> {
        self.record.csrf.as_ref()
    }

    pub fn set_csrf_token(&mut self, token: CsrfToken) {
        self.record.csrf = Some(token);
    }

    #[must_use]
    pub fn identity_credential(&self) -> Option<&IdentityCredential> {
        self.record.id_token.as_ref()
    }

    pub fn set_identity_credential(&mut self, credential: IdentityCredential) {
        self.record.id_token = Some(credential);
    }

    #[must_use]
    pub fn authentication_state(&self) -> AuthenticationState {
        if self.record.id_token.is_some() {
            AuthenticationState::Identified
        } else {
            AuthenticationState::Anonymous
        }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.record.extra.get(field)
    }

    /// Store a bookkeeping field. Reserved names are refused and return `None`.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        let field = field.into();
        if RESERVED_FIELDS.contains(&field.as_str()) {
            tracing::warn!(field = %field, "Refusing to overwrite reserved session field");
            return None;
        }
        self.record.extra.insert(field, value)
    }
}
