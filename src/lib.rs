#![doc = include_str!("../README.md")]

pub mod codec;
pub mod csrf;
pub mod error;
pub mod middleware;
#[cfg(feature = "provider")]
pub mod provider;
pub mod session;
pub mod token;
pub mod types;

// Re-exports for convenient access
pub use codec::SessionCodec;
pub use csrf::{CsrfRejection, issue_if_anonymous, should_issue, verify_token};
pub use error::{Error, VerificationFailure};
#[cfg(feature = "provider")]
pub use provider::{
    IdentityProviderClient, ProviderConfig, SubjectAccount, global_provider, init_provider,
};
pub use session::{AuthenticationState, Session, SessionRecord};
pub use token::{PublicKey, VerifiedCredential, parse_public_key_hex, verify_credential};
pub use types::{CsrfToken, IdentityCredential, SessionKey, SubjectId};
