use async_trait::async_trait;

use super::{AuthError, Credentials, EmailOtpType, Profile, Session, SessionUser, SignUpOutcome};

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Abstraction over the external auth provider.
///
/// Implementations perform exactly one network round-trip per call and never
/// retry.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange credentials for a session.
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session>;

    /// Register a new user. `email_redirect_to` is where the confirmation
    /// link should land.
    async fn sign_up(
        &self,
        credentials: &Credentials,
        email_redirect_to: Option<&str>,
    ) -> Result<SignUpOutcome>;

    /// Validate an access token and return its user.
    async fn get_user(&self, access_token: &str) -> Result<SessionUser>;

    /// Exchange a refresh token for a new session.
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session>;

    /// Verify an e-mail one-time token (confirmation link).
    async fn verify_otp(&self, token_hash: &str, otp_type: EmailOtpType) -> Result<Session>;

    /// Revoke the session behind an access token.
    async fn sign_out(&self, access_token: &str) -> Result<()>;
}

/// Read-only access to the profile store.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Look up the profile for a user. `access_token` scopes the query to the
    /// caller so row-level security applies.
    async fn get_profile(&self, user_id: &str, access_token: &str) -> Result<Option<Profile>>;
}
