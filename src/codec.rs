//! Signed-blob codec for session cookies.
//!
//! Values are signed with HMAC-SHA256 through the `cookie` crate's signed jar,
//! so any edit made by the client is detected on the next request.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use cookie::{Cookie, CookieJar, Key};

use crate::error::Error;
use crate::session::SessionRecord;

#[derive(Clone)]
pub struct SessionCodec {
    key: Key,
    cookie_name: String,
}

impl SessionCodec {
    #[must_use]
    pub fn new(key: Key, cookie_name: impl Into<String>) -> Self {
        Self {
            key,
            cookie_name: cookie_name.into(),
        }
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Sign `value`, returning the tamper-evident cookie value.
    #[must_use]
    pub fn sign(&self, value: &str) -> String {
        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key)
            .add(Cookie::new(self.cookie_name.clone(), value.to_owned()));
        jar.get(&self.cookie_name)
            .map(|c| c.value().to_owned())
            .unwrap_or_default()
    }

    /// Check the signature and return the original value.
    #[must_use]
    pub fn verify(&self, signed: &str) -> Option<String> {
        let mut jar = CookieJar::new();
        jar.add_original(Cookie::new(self.cookie_name.clone(), signed.to_owned()));
        jar.signed(&self.key)
            .get(&self.cookie_name)
            .map(|c| c.value().to_owned())
    }

    /// Encode a record as `sign(base64url(json))`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Codec`] if the record fails to serialize.
    pub fn encode_record(&self, record: &SessionRecord) -> Result<String, Error> {
        let json = serde_json::to_vec(record).map_err(|e| Error::Codec(e.to_string()))?;
        Ok(self.sign(&URL_SAFE_NO_PAD.encode(json)))
    }

    /// Verify and decode a record produced by [`encode_record`](Self::encode_record).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Codec`] on a bad signature or an undecodable payload.
    pub fn decode_record(&self, signed: &str) -> Result<SessionRecord, Error> {
        let payload = self
            .verify(signed)
            .ok_or_else(|| Error::Codec("signature mismatch".into()))?;
        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| Error::Codec(e.to_string()))?;
        serde_json::from_slice(&json).map_err(|e| Error::Codec(e.to_string()))
    }
}
