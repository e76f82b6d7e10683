use authgate_core::auth::ProtectedPaths;
use url::Url;

use crate::error::AuthError;

/// Complete auth configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Provider project URL, e.g. `https://xyzcompany.supabase.co`.
    pub supabase_url: Url,
    /// Public (anon / publishable) API key.
    pub anon_key: String,
    pub login_path: String,
    /// Where a successful sign-in lands when no valid `redirectTo` was given.
    pub default_redirect: String,
    pub protected: ProtectedPaths,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub profiles_table: String,
}

impl AuthConfig {
    /// Configuration with defaults for everything but the provider.
    pub fn new(supabase_url: Url, anon_key: impl Into<String>) -> Self {
        Self {
            supabase_url,
            anon_key: anon_key.into(),
            login_path: "/auth/login".to_string(),
            default_redirect: "/protected".to_string(),
            protected: ProtectedPaths::default(),
            cookie_name: "sb-auth-token".to_string(),
            cookie_secure: true,
            profiles_table: "profiles".to_string(),
        }
    }

    /// Configuration for the in-memory provider: no project, plain-HTTP
    /// cookies. Environment overrides still apply.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` if the overrides are inconsistent.
    #[cfg(any(test, feature = "mock"))]
    pub fn mock() -> Result<Self, AuthError> {
        let url = Url::parse("http://localhost:54321")
            .map_err(|e| AuthError::Config(e.to_string()))?;
        let mut config = Self::new(url, "mock-anon-key");
        config.cookie_secure = false;
        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SUPABASE_URL`: provider project URL (required)
    /// - `SUPABASE_ANON_KEY` or `SUPABASE_PUBLISHABLE_KEY`: public API key (required)
    /// - `AUTH_LOGIN_PATH`: login route (default: `/auth/login`)
    /// - `AUTH_DEFAULT_REDIRECT`: post-login target (default: `/protected`)
    /// - `AUTH_PROTECTED_PREFIXES`: comma-separated protected prefixes (default: `/protected`)
    /// - `COOKIE_SECURE`: whether to set the secure flag on cookies (default: true)
    /// - `PROFILES_TABLE`: profile table name (default: `profiles`)
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` if the provider URL or key is missing, or
    /// the URL does not parse.
    pub fn from_env() -> Result<Self, AuthError> {
        let supabase_url = std::env::var("SUPABASE_URL")
            .map_err(|_| AuthError::Config("SUPABASE_URL is not set".to_string()))?;
        let supabase_url: Url = supabase_url
            .parse()
            .map_err(|e| AuthError::Config(format!("SUPABASE_URL is not a valid URL: {e}")))?;

        let anon_key = std::env::var("SUPABASE_ANON_KEY")
            .or_else(|_| std::env::var("SUPABASE_PUBLISHABLE_KEY"))
            .map_err(|_| AuthError::Config("SUPABASE_ANON_KEY is not set".to_string()))?;

        let config = Self::new(supabase_url, anon_key).with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply the optional environment overrides on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("AUTH_LOGIN_PATH") {
            self.login_path = path;
        }
        if let Ok(target) = std::env::var("AUTH_DEFAULT_REDIRECT") {
            self.default_redirect = target;
        }
        if let Ok(list) = std::env::var("AUTH_PROTECTED_PREFIXES") {
            self.protected = ProtectedPaths::parse(&list);
        }
        if let Ok(table) = std::env::var("PROFILES_TABLE") {
            self.profiles_table = table;
        }
        self.cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(self.cookie_secure);
        self
    }

    /// Reject combinations that would make the guard loop or leak.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` if the login route is itself protected
    /// (every redirect would be guarded again) or if a route is not an
    /// absolute path.
    pub fn validate(&self) -> Result<(), AuthError> {
        if !self.login_path.starts_with('/') {
            return Err(AuthError::Config(format!(
                "login path must start with '/': {}",
                self.login_path
            )));
        }
        if !self.default_redirect.starts_with('/') {
            return Err(AuthError::Config(format!(
                "default redirect must start with '/': {}",
                self.default_redirect
            )));
        }
        if self.protected.is_protected(&self.login_path) {
            return Err(AuthError::Config(format!(
                "login path {} is covered by a protected prefix",
                self.login_path
            )));
        }
        Ok(())
    }
}
