use pasetors::Public;
use pasetors::keys::AsymmetricPublicKey;
use pasetors::token::UntrustedToken;
use pasetors::version4::{PublicToken, V4};
use serde_json::Value as JsonValue;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::{Error, VerificationFailure};
use crate::types::SubjectId;

const TOKEN_PREFIX: &str = "v4.public.";

/// Ed25519 public key (32 bytes) of the trusted issuer.
#[derive(Clone)]
pub struct PublicKey {
    bytes: [u8; 32],
}

impl PublicKey {
    /// Get the raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.bytes))
    }
}

/// Parses a hex-encoded Ed25519 public key (32 bytes) into a `PublicKey`.
///
/// # Errors
///
/// Returns `Error::Token` if the hex is invalid or the key length is not 32 bytes.
pub fn parse_public_key_hex(public_key_hex: &str) -> Result<PublicKey, Error> {
    let bytes = hex::decode(public_key_hex.trim())
        .map_err(|e| Error::Token(format!("invalid hex: {e}")))?;
    let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
        Error::Token(format!("invalid key length: expected 32, got {}", b.len()))
    })?;
    Ok(PublicKey { bytes })
}

/// Claims of a credential that passed signature and claim checks.
#[derive(Debug, Clone)]
pub struct VerifiedCredential {
    pub subject: SubjectId,
    pub issued_at: Option<OffsetDateTime>,
    pub expires_at: OffsetDateTime,
}

/// Verifies a PASETO v4.public session credential as of `now`.
///
/// Checks, in order: format, signature, `exp` (required), `nbf`, `iss`,
/// `aud`, and a non-empty `sub`. Revocation is the provider's concern.
///
/// # Errors
///
/// Returns the first [`VerificationFailure`] encountered.
pub fn verify_credential(
    public_key: &PublicKey,
    token_str: &str,
    expected_issuer: &str,
    expected_audience: &str,
    now: OffsetDateTime,
) -> Result<VerifiedCredential, VerificationFailure> {
    if !token_str.starts_with(TOKEN_PREFIX) {
        return Err(VerificationFailure::Malformed("invalid token format".into()));
    }

    let pk = AsymmetricPublicKey::<V4>::from(&public_key.bytes[..])
        .map_err(|e| VerificationFailure::Malformed(e.to_string()))?;

    let untrusted_token = UntrustedToken::<Public, V4>::try_from(token_str)
        .map_err(|e| VerificationFailure::Malformed(e.to_string()))?;

    // Claim checks happen below so each failure keeps its own kind.
    let trusted_token = PublicToken::verify(&pk, &untrusted_token, None, None)
        .map_err(|_| VerificationFailure::Malformed("signature verification failed".into()))?;

    let claims: JsonValue = serde_json::from_str(trusted_token.payload())
        .map_err(|e| VerificationFailure::Malformed(e.to_string()))?;

    let expires_at = time_claim(&claims, "exp")?
        .ok_or_else(|| VerificationFailure::Malformed("missing claim: exp".into()))?;
    if expires_at <= now {
        return Err(VerificationFailure::Expired);
    }
    if let Some(not_before) = time_claim(&claims, "nbf")? {
        if not_before > now {
            return Err(VerificationFailure::Malformed("token not yet valid".into()));
        }
    }
    let issued_at = time_claim(&claims, "iat")?;

    let actual_issuer = string_claim(&claims, "iss")?;
    if actual_issuer != expected_issuer {
        return Err(VerificationFailure::IssuerMismatch(format!(
            "iss: expected '{expected_issuer}', got '{actual_issuer}'"
        )));
    }

    let actual_audience = string_claim(&claims, "aud")?;
    if actual_audience != expected_audience {
        return Err(VerificationFailure::IssuerMismatch(format!(
            "aud: expected '{expected_audience}', got '{actual_audience}'"
        )));
    }

    let subject = string_claim(&claims, "sub")?;
    if subject.is_empty() {
        return Err(VerificationFailure::Malformed("empty claim: sub".into()));
    }

    Ok(VerifiedCredential {
        subject: SubjectId::from(subject),
        issued_at,
        expires_at,
    })
}

fn string_claim<'a>(claims: &'a JsonValue, name: &str) -> Result<&'a str, VerificationFailure> {
    claims
        .get(name)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| VerificationFailure::Malformed(format!("missing claim: {name}")))
}

fn time_claim(
    claims: &JsonValue,
    name: &str,
) -> Result<Option<OffsetDateTime>, VerificationFailure> {
    let Some(value) = claims.get(name) else {
        return Ok(None);
    };
    let text = value
        .as_str()
        .ok_or_else(|| VerificationFailure::Malformed(format!("claim {name} is not a string")))?;
    OffsetDateTime::parse(text, &Rfc3339)
        .map(Some)
        .map_err(|e| VerificationFailure::Malformed(format!("claim {name}: {e}")))
}
