//! In-memory auth provider for development and tests.
//!
//! Mirrors the observable behavior of GoTrue closely enough to drive the
//! guard, the session accessor and the auth routes without a network:
//! opaque random tokens, rotating refresh tokens, optional e-mail
//! confirmation through token hashes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use authgate_core::auth::{
    AuthError, AuthProvider, Credentials, EmailOtpType, Result, Session, SessionUser,
    SignUpOutcome,
};
use chrono::{DateTime, Duration, Utc};
use rand::{distr::Alphanumeric, Rng};
use tokio::sync::RwLock;

struct MockUser {
    user: SessionUser,
    password: String,
    confirmed: bool,
}

#[derive(Default)]
struct MockStore {
    /// Keyed by lowercased e-mail.
    users: HashMap<String, MockUser>,
    /// access token -> (user id, expiry)
    access: HashMap<String, (String, DateTime<Utc>)>,
    /// refresh token -> user id
    refresh: HashMap<String, String>,
    /// confirmation token hash -> e-mail
    pending: HashMap<String, String>,
}

/// Mock provider holding users and tokens in memory.
#[derive(Clone)]
pub struct MockProvider {
    store: Arc<RwLock<MockStore>>,
    access_ttl: Duration,
    require_confirmation: bool,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(MockStore::default())),
            access_ttl: Duration::hours(1),
            require_confirmation: false,
        }
    }

    /// Seed a confirmed user.
    pub fn with_user(self, email: &str, password: &str) -> Self {
        let user = MockUser {
            user: SessionUser::new(uuid::Uuid::new_v4().to_string(), Some(email.to_string())),
            password: password.to_string(),
            confirmed: true,
        };
        // The store is not shared yet, so the lock is uncontended.
        if let Ok(mut store) = self.store.try_write() {
            store.users.insert(email.to_ascii_lowercase(), user);
        }
        self
    }

    /// Lifetime of issued access tokens.
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Make sign-up return an unconfirmed user instead of a session.
    pub fn require_confirmation(mut self) -> Self {
        self.require_confirmation = true;
        self
    }

    /// The token hash that would be mailed to `email`, if a confirmation is
    /// pending.
    pub async fn pending_confirmation(&self, email: &str) -> Option<String> {
        let email = email.to_ascii_lowercase();
        let store = self.store.read().await;
        store
            .pending
            .iter()
            .find(|(_, pending)| **pending == email)
            .map(|(hash, _)| hash.clone())
    }

    /// Id of the user registered under `email`.
    pub async fn user_id(&self, email: &str) -> Option<String> {
        let store = self.store.read().await;
        store
            .users
            .get(&email.to_ascii_lowercase())
            .map(|u| u.user.id.clone())
    }

    /// Forget an access token, as if the provider had revoked it.
    pub async fn revoke_access_token(&self, access_token: &str) {
        self.store.write().await.access.remove(access_token);
    }

    fn issue(&self, store: &mut MockStore, user: &SessionUser) -> Session {
        let access_token = random_token();
        let refresh_token = random_token();
        let expires_at = Utc::now() + self.access_ttl;

        store
            .access
            .insert(access_token.clone(), (user.id.clone(), expires_at));
        store.refresh.insert(refresh_token.clone(), user.id.clone());

        Session {
            access_token,
            refresh_token,
            expires_at,
            user: user.clone(),
        }
    }
}

fn random_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(40)
        .map(char::from)
        .collect()
}

fn find_by_id<'a>(store: &'a MockStore, user_id: &str) -> Option<&'a MockUser> {
    store.users.values().find(|u| u.user.id == user_id)
}

#[async_trait]
impl AuthProvider for MockProvider {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session> {
        let mut store = self.store.write().await;
        let key = credentials.email.to_ascii_lowercase();

        let user = match store.users.get(&key) {
            Some(u) if u.password == credentials.password => u,
            _ => return Err(AuthError::InvalidCredentials),
        };
        if !user.confirmed {
            return Err(AuthError::EmailNotConfirmed);
        }

        let user = user.user.clone();
        Ok(self.issue(&mut store, &user))
    }

    async fn sign_up(
        &self,
        credentials: &Credentials,
        _email_redirect_to: Option<&str>,
    ) -> Result<SignUpOutcome> {
        let mut store = self.store.write().await;
        let key = credentials.email.to_ascii_lowercase();

        if store.users.contains_key(&key) {
            return Err(AuthError::from_provider(
                422,
                Some("user_already_exists"),
                "User already registered",
            ));
        }

        let user = SessionUser::new(
            uuid::Uuid::new_v4().to_string(),
            Some(credentials.email.clone()),
        );
        store.users.insert(
            key.clone(),
            MockUser {
                user: user.clone(),
                password: credentials.password.clone(),
                confirmed: !self.require_confirmation,
            },
        );

        if self.require_confirmation {
            store.pending.insert(random_token(), key);
            return Ok(SignUpOutcome::ConfirmationRequired(user));
        }

        Ok(SignUpOutcome::SignedIn(self.issue(&mut store, &user)))
    }

    async fn get_user(&self, access_token: &str) -> Result<SessionUser> {
        let store = self.store.read().await;
        let (user_id, expires_at) = store.access.get(access_token).ok_or_else(|| {
            AuthError::from_provider(401, Some("bad_jwt"), "invalid JWT: token is unknown")
        })?;

        if *expires_at <= Utc::now() {
            return Err(AuthError::SessionExpired);
        }

        find_by_id(&store, user_id)
            .map(|u| u.user.clone())
            .ok_or(AuthError::SessionNotFound)
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        let mut store = self.store.write().await;

        // Refresh tokens are single use.
        let user_id = store.refresh.remove(refresh_token).ok_or_else(|| {
            AuthError::from_provider(
                400,
                Some("refresh_token_not_found"),
                "Invalid Refresh Token: Refresh Token Not Found",
            )
        })?;

        let user = find_by_id(&store, &user_id)
            .map(|u| u.user.clone())
            .ok_or(AuthError::SessionNotFound)?;
        Ok(self.issue(&mut store, &user))
    }

    async fn verify_otp(&self, token_hash: &str, _otp_type: EmailOtpType) -> Result<Session> {
        let mut store = self.store.write().await;

        let email = store.pending.remove(token_hash).ok_or_else(|| {
            AuthError::from_provider(
                403,
                Some("otp_expired"),
                "Email link is invalid or has expired",
            )
        })?;

        let user = match store.users.get_mut(&email) {
            Some(u) => {
                u.confirmed = true;
                u.user.clone()
            }
            None => return Err(AuthError::SessionNotFound),
        };
        Ok(self.issue(&mut store, &user))
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let mut store = self.store.write().await;
        let (user_id, _) = store.access.remove(access_token).ok_or_else(|| {
            AuthError::from_provider(401, Some("bad_jwt"), "invalid JWT: token is unknown")
        })?;

        // Global scope: every token of this user goes.
        store.access.retain(|_, (id, _)| *id != user_id);
        store.refresh.retain(|_, id| *id != user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> MockProvider {
        MockProvider::new().with_user("user@example.com", "password123")
    }

    fn creds(password: &str) -> Credentials {
        Credentials::new("user@example.com", password)
    }

    #[tokio::test]
    async fn sign_in_and_get_user() {
        let provider = provider();
        let session = provider
            .sign_in_with_password(&creds("password123"))
            .await
            .unwrap();

        let user = provider.get_user(&session.access_token).await.unwrap();
        assert_eq!(user, session.user);
        assert_eq!(user.email.as_deref(), Some("user@example.com"));
    }

    #[tokio::test]
    async fn email_match_is_case_insensitive() {
        let provider = provider();
        let result = provider
            .sign_in_with_password(&Credentials::new("User@Example.com", "password123"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let err = provider()
            .sign_in_with_password(&creds("nope"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn expired_access_token_is_rejected() {
        let provider = provider().with_access_ttl(Duration::seconds(-1));
        let session = provider
            .sign_in_with_password(&creds("password123"))
            .await
            .unwrap();

        let err = provider.get_user(&session.access_token).await.unwrap_err();
        assert!(err.is_unauthenticated());
    }

    #[tokio::test]
    async fn refresh_rotates_tokens() {
        let provider = provider();
        let first = provider
            .sign_in_with_password(&creds("password123"))
            .await
            .unwrap();

        let second = provider.refresh_session(&first.refresh_token).await.unwrap();
        assert_ne!(first.access_token, second.access_token);
        assert_eq!(first.user, second.user);

        // Reuse of a consumed refresh token fails.
        let err = provider
            .refresh_session(&first.refresh_token)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::SessionExpired);
    }

    #[tokio::test]
    async fn confirmation_flow() {
        let provider = MockProvider::new().require_confirmation();
        let outcome = provider
            .sign_up(&Credentials::new("new@example.com", "password123"), None)
            .await
            .unwrap();
        assert!(matches!(outcome, SignUpOutcome::ConfirmationRequired(_)));

        let err = provider
            .sign_in_with_password(&Credentials::new("new@example.com", "password123"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::EmailNotConfirmed);

        let hash = provider
            .pending_confirmation("new@example.com")
            .await
            .unwrap();
        let session = provider
            .verify_otp(&hash, EmailOtpType::Signup)
            .await
            .unwrap();
        assert_eq!(session.user.email.as_deref(), Some("new@example.com"));

        // Links are single use.
        assert!(provider
            .verify_otp(&hash, EmailOtpType::Signup)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn duplicate_sign_up_is_rejected() {
        let err = provider()
            .sign_up(&creds("password123"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Provider { status: 422, .. }));
    }

    #[tokio::test]
    async fn sign_out_revokes_all_tokens() {
        let provider = provider();
        let a = provider
            .sign_in_with_password(&creds("password123"))
            .await
            .unwrap();
        let b = provider
            .sign_in_with_password(&creds("password123"))
            .await
            .unwrap();

        provider.sign_out(&a.access_token).await.unwrap();

        assert!(provider.get_user(&b.access_token).await.is_err());
        assert!(provider.refresh_session(&b.refresh_token).await.is_err());
    }
}
