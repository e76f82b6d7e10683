//! Request-scoped session access.
//!
//! The session cookie is never trusted on its own: every lookup validates
//! the access token with the provider. Tokens that are expired (or about to
//! be) or that the provider rejects are refreshed once; when the refresh
//! fails too, the request has no session and the cookie is cleared.

use authgate_core::auth::{needs_refresh, AuthError as CoreError, AuthEvent, Session};
use axum_extra::extract::CookieJar;
use chrono::Utc;

use crate::cookies;
use crate::error::AuthError;
use crate::state::AuthState;

/// What the response has to do with the session cookie.
#[derive(Debug, Clone, PartialEq)]
pub enum CookieUpdate {
    Keep,
    Set(Session),
    Clear,
}

/// Outcome of resolving the current session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionLookup {
    pub session: Option<Session>,
    pub cookie: CookieUpdate,
}

impl SessionLookup {
    fn none(cookie: CookieUpdate) -> Self {
        Self {
            session: None,
            cookie,
        }
    }

    /// Apply the cookie update to `jar`.
    pub fn apply(&self, jar: CookieJar, state: &AuthState) -> CookieJar {
        match &self.cookie {
            CookieUpdate::Keep => jar,
            CookieUpdate::Set(session) => cookies::set_session(jar, &state.config, session),
            CookieUpdate::Clear => cookies::clear_session(jar, &state.config),
        }
    }
}

/// Errors that say nothing about the session itself.
fn is_transient(err: &CoreError) -> bool {
    match err {
        CoreError::Network(_) | CoreError::RateLimited => true,
        CoreError::Provider { status, .. } => *status >= 500,
        _ => false,
    }
}

impl AuthState {
    /// Resolve the session carried by the request cookies.
    ///
    /// # Errors
    ///
    /// Returns an error only when the provider could not be asked (network
    /// failure, rate limiting, 5xx). A missing, malformed or rejected session
    /// is `Ok` with `session: None`.
    pub async fn current_session(&self, jar: &CookieJar) -> Result<SessionLookup, AuthError> {
        let Some(session) = cookies::read_session(jar, &self.config) else {
            let cookie = if cookies::has_session_cookie(jar, &self.config) {
                CookieUpdate::Clear
            } else {
                CookieUpdate::Keep
            };
            return Ok(SessionLookup::none(cookie));
        };

        if needs_refresh(&session, Utc::now()) {
            tracing::debug!(user_id = %session.user.id, "access token expiring, refreshing");
            return self.refresh(&session).await;
        }

        match self.provider.get_user(&session.access_token).await {
            Ok(user) => Ok(SessionLookup {
                session: Some(Session { user, ..session }),
                cookie: CookieUpdate::Keep,
            }),
            Err(err) if err.is_unauthenticated() => {
                tracing::debug!(user_id = %session.user.id, error = %err, "access token rejected, refreshing");
                self.refresh(&session).await
            }
            Err(err) if is_transient(&err) => Err(err.into()),
            Err(err) => {
                tracing::debug!(error = %err, "session validation failed");
                Ok(SessionLookup::none(CookieUpdate::Clear))
            }
        }
    }

    async fn refresh(&self, session: &Session) -> Result<SessionLookup, AuthError> {
        match self.provider.refresh_session(&session.refresh_token).await {
            Ok(fresh) => {
                self.events.publish(AuthEvent::TokenRefreshed {
                    user: fresh.user.clone(),
                });
                Ok(SessionLookup {
                    session: Some(fresh.clone()),
                    cookie: CookieUpdate::Set(fresh),
                })
            }
            Err(err) if is_transient(&err) => Err(err.into()),
            Err(err) => {
                tracing::debug!(user_id = %session.user.id, error = %err, "refresh failed, dropping session");
                Ok(SessionLookup::none(CookieUpdate::Clear))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::profiles::InMemoryProfiles;
    use crate::providers::MockProvider;
    use authgate_core::auth::{AuthProvider, Credentials};
    use axum::http::{HeaderMap, HeaderValue};
    use chrono::Duration;

    fn config() -> AuthConfig {
        AuthConfig::new("http://localhost:54321".parse().unwrap(), "anon")
    }

    fn state(provider: MockProvider) -> AuthState {
        AuthState::mock(provider, InMemoryProfiles::new(), config())
    }

    fn jar_with(value: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        let cookie = format!("sb-auth-token={value}");
        headers.insert("cookie", HeaderValue::from_str(&cookie).unwrap());
        CookieJar::from_headers(&headers)
    }

    async fn signed_in(provider: &MockProvider) -> Session {
        provider
            .sign_in_with_password(&Credentials::new("user@example.com", "password123"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn no_cookie_is_no_session() {
        let state = state(MockProvider::new());
        let lookup = state.current_session(&CookieJar::new()).await.unwrap();
        assert_eq!(lookup, SessionLookup::none(CookieUpdate::Keep));
    }

    #[tokio::test]
    async fn malformed_cookie_is_cleared() {
        let state = state(MockProvider::new());
        let lookup = state.current_session(&jar_with("garbage")).await.unwrap();
        assert_eq!(lookup, SessionLookup::none(CookieUpdate::Clear));
    }

    #[tokio::test]
    async fn valid_session_is_kept() {
        let provider = MockProvider::new().with_user("user@example.com", "password123");
        let session = signed_in(&provider).await;
        let state = state(provider);

        let jar = jar_with(&cookies::encode_session(&session));
        let lookup = state.current_session(&jar).await.unwrap();

        assert_eq!(lookup.session, Some(session));
        assert_eq!(lookup.cookie, CookieUpdate::Keep);
    }

    #[tokio::test]
    async fn expiring_session_is_refreshed() {
        let provider = MockProvider::new()
            .with_user("user@example.com", "password123")
            .with_access_ttl(Duration::seconds(5));
        let session = signed_in(&provider).await;
        let state = state(provider);
        let mut sub = state.events.subscribe(&session.user.id);

        let jar = jar_with(&cookies::encode_session(&session));
        let lookup = state.current_session(&jar).await.unwrap();

        let fresh = lookup.session.clone().unwrap();
        assert_ne!(fresh.access_token, session.access_token);
        assert_eq!(lookup.cookie, CookieUpdate::Set(fresh));
        assert!(matches!(
            sub.next_event().await,
            Some(AuthEvent::TokenRefreshed { .. })
        ));
    }

    #[tokio::test]
    async fn revoked_access_token_is_refreshed() {
        let provider = MockProvider::new().with_user("user@example.com", "password123");
        let session = signed_in(&provider).await;
        provider.revoke_access_token(&session.access_token).await;
        let state = state(provider);

        let jar = jar_with(&cookies::encode_session(&session));
        let lookup = state.current_session(&jar).await.unwrap();

        assert!(lookup.session.is_some());
        assert!(matches!(lookup.cookie, CookieUpdate::Set(_)));
    }

    #[tokio::test]
    async fn failed_refresh_clears_the_cookie() {
        let provider = MockProvider::new().with_user("user@example.com", "password123");
        let session = signed_in(&provider).await;
        provider.sign_out(&session.access_token).await.unwrap();
        let state = state(provider);

        let jar = jar_with(&cookies::encode_session(&session));
        let lookup = state.current_session(&jar).await.unwrap();

        assert_eq!(lookup, SessionLookup::none(CookieUpdate::Clear));
    }

    #[test]
    fn transient_errors() {
        assert!(is_transient(&CoreError::Network("down".into())));
        assert!(is_transient(&CoreError::from_provider(503, None, "unavailable")));
        assert!(!is_transient(&CoreError::SessionExpired));
        assert!(!is_transient(&CoreError::from_provider(400, None, "bad")));
    }
}
