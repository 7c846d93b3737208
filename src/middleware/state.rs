use std::sync::Arc;

use super::config::AuthSettings;

/// Shared state for session route handlers.
pub(super) struct AuthState<S, P> {
    pub(super) store: Arc<S>,
    pub(super) provider: Arc<P>,
    pub(super) settings: AuthSettings,
}

// Manual Clone: avoid derive adding `S: Clone, P: Clone` bounds.
impl<S, P> Clone for AuthState<S, P> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            provider: self.provider.clone(),
            settings: self.settings.clone(),
        }
    }
}
