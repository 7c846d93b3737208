//! Session lifecycle routes and building blocks for Axum.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use idp_session::middleware::{SessionAuthConfig, session_routes};
//! use idp_session::{ProviderConfig, init_provider};
//!
//! // 1. Configure from environment
//! let config = SessionAuthConfig::from_env()?;
//! let provider = init_provider(ProviderConfig::from_env()?);
//!
//! // 2. Pick a session store
//! let store = Arc::new(config.cookie_store());
//!
//! // 3. Mount the routes
//! let app = axum::Router::new().merge(session_routes(config, store.clone(), provider));
//!
//! // 4. Read session data in your own handlers
//! let ctx = get_session_data(&store, &jar, false).await?;
//! ```

mod accessor;
mod config;
mod cookies;
mod error;
mod logout;
mod routes;
mod state;
mod store;
mod traits;

pub use accessor::{SessionContext, get_session_data};
pub use config::SessionAuthConfig;
pub use error::AuthError;
pub use logout::revoke;
pub use routes::session_routes;
pub use store::{CookieSessionStore, MemorySessionStore};
pub use traits::{BoxError, CredentialRevoker, IdentityProvider, IdentityVerifier, SessionStore};

/// Re-export cookie key type for builder API.
pub use cookie::Key as CookieKey;
