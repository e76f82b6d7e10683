//! Application state.
//!
//! Wraps the auth state (provider, profile store, event hub) together with
//! server settings and the shutdown signal for long-lived connections.

use tokio::sync::broadcast;

use authgate_auth::AuthState;

use crate::config::Config;

/// Demo account seeded in mock mode.
#[cfg(feature = "mock")]
pub const DEMO_EMAIL: &str = "user@example.com";
#[cfg(feature = "mock")]
pub const DEMO_PASSWORD: &str = "password123";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub config: Config,
    /// Shutdown signal sender for SSE connections.
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(auth: AuthState, config: Config) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            auth,
            config,
            shutdown_tx,
        }
    }

    /// State backed by the in-memory provider, seeded with a demo user.
    ///
    /// # Errors
    ///
    /// Returns an error if the auth environment overrides are invalid.
    #[cfg(feature = "mock")]
    pub async fn mock(config: Config) -> Result<Self, authgate_auth::AuthError> {
        use authgate_auth::{AuthConfig, InMemoryProfiles, MockProvider};
        use authgate_core::auth::Profile;

        let provider = MockProvider::new().with_user(DEMO_EMAIL, DEMO_PASSWORD);
        let profiles = InMemoryProfiles::new();

        if let Some(id) = provider.user_id(DEMO_EMAIL).await {
            profiles
                .upsert(Profile {
                    id,
                    full_name: Some("Demo User".to_string()),
                    username: Some("demo".to_string()),
                    avatar_url: None,
                })
                .await;
        }

        tracing::info!(email = DEMO_EMAIL, "mock auth provider enabled with demo user");

        let auth = AuthState::mock(provider, profiles, AuthConfig::mock()?);
        Ok(Self::new(auth, config))
    }

    /// Signal all SSE connections to close.
    pub fn signal_shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }
}

impl AsRef<AuthState> for AppState {
    fn as_ref(&self) -> &AuthState {
        &self.auth
    }
}
