//! Application state for auth.

use std::sync::Arc;

use authgate_core::auth::{AuthProvider, ProfileRepository};
use axum::extract::FromRef;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::listener::AuthEvents;
use crate::profiles::PostgrestProfiles;
use crate::providers::SupabaseProvider;

/// Shared state for the guard, the extractors and the auth handlers.
#[derive(Clone)]
pub struct AuthState {
    pub provider: Arc<dyn AuthProvider>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub config: AuthConfig,
    pub events: AuthEvents,
}

impl AuthState {
    pub fn new(
        provider: Arc<dyn AuthProvider>,
        profiles: Arc<dyn ProfileRepository>,
        config: AuthConfig,
    ) -> Self {
        Self {
            provider,
            profiles,
            config,
            events: AuthEvents::new(),
        }
    }

    /// State talking to the Supabase project named in `config`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the HTTP clients cannot be built from the
    /// configured URL and key.
    pub fn from_config(config: AuthConfig) -> Result<Self, AuthError> {
        let provider = SupabaseProvider::new(&config.supabase_url, &config.anon_key)?;
        let profiles = PostgrestProfiles::new(
            &config.supabase_url,
            &config.anon_key,
            &config.profiles_table,
        )?;

        tracing::info!(
            supabase_url = %config.supabase_url,
            protected = ?config.protected.prefixes(),
            "auth configured"
        );

        Ok(Self::new(Arc::new(provider), Arc::new(profiles), config))
    }

    /// State backed by the in-memory provider and profile store.
    #[cfg(any(test, feature = "mock"))]
    pub fn mock(
        provider: crate::providers::MockProvider,
        profiles: crate::profiles::InMemoryProfiles,
        config: AuthConfig,
    ) -> Self {
        Self::new(Arc::new(provider), Arc::new(profiles), config)
    }
}

/// Allows AuthState to be extracted from a parent state.
impl<S> FromRef<S> for AuthState
where
    S: AsRef<AuthState>,
{
    fn from_ref(state: &S) -> Self {
        state.as_ref().clone()
    }
}
