//! Axum extractors for the current session.
//!
//! Page handlers re-check the session even behind the guard. When the guard
//! already resolved it for this request, that result is reused; otherwise
//! the accessor runs here. Only the guard writes cookies, so a refresh done
//! here does not reach the browser: mount [`route_guard`] in front of every
//! route that uses these extractors.
//!
//! [`route_guard`]: crate::route_guard

use authgate_core::auth::{login_redirect, Session};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::accessor::CookieUpdate;
use crate::middleware::ResolvedSession;
use crate::AuthState;

async fn resolve<S>(parts: &mut Parts, state: &S) -> Result<Option<Session>, Response>
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    if let Some(ResolvedSession(session)) = parts.extensions.get::<ResolvedSession>() {
        return Ok(session.clone());
    }

    let auth_state = AuthState::from_ref(state);
    let jar = CookieJar::from_headers(&parts.headers);
    let lookup = auth_state
        .current_session(&jar)
        .await
        .map_err(IntoResponse::into_response)?;
    if lookup.cookie != CookieUpdate::Keep {
        tracing::warn!(path = %parts.uri.path(), "session cookie update dropped, route guard not mounted");
    }
    Ok(lookup.session)
}

/// Extractor for a signed-in session. Redirects to the login page if there
/// is none.
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match resolve(parts, state).await? {
            Some(session) => Ok(CurrentSession(session)),
            None => {
                let auth_state = AuthState::from_ref(state);
                let original = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                let target = login_redirect(&auth_state.config.login_path, original);
                Err(Redirect::to(&target).into_response())
            }
        }
    }
}

/// Extractor for an optional session. Never rejects: provider failures read
/// as signed out.
pub struct OptionalSession(pub Option<Session>);

impl<S> FromRequestParts<S> for OptionalSession
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match resolve(parts, state).await {
            Ok(session) => Ok(OptionalSession(session)),
            Err(_) => Ok(OptionalSession(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::cookies;
    use crate::profiles::InMemoryProfiles;
    use crate::providers::MockProvider;
    use authgate_core::auth::{AuthProvider, Credentials};
    use axum::{
        body::Body,
        http::{header::LOCATION, Request, StatusCode},
        routing::get,
        Router,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn required(CurrentSession(session): CurrentSession) -> String {
        session.user.id
    }

    async fn optional(OptionalSession(session): OptionalSession) -> String {
        session.map(|s| s.user.id).unwrap_or_default()
    }

    fn app(provider: MockProvider) -> Router {
        let config = AuthConfig::new("http://localhost:54321".parse().unwrap(), "anon");
        let state = AuthState::mock(provider, InMemoryProfiles::new(), config);
        Router::new()
            .route("/account", get(required))
            .route("/maybe", get(optional))
            .with_state(state)
    }

    #[tokio::test]
    async fn current_session_without_cookie_redirects() {
        let response = app(MockProvider::new())
            .oneshot(Request::get("/account?x=1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/auth/login?redirectTo=/account%3Fx%3D1"
        );
    }

    #[tokio::test]
    async fn current_session_with_cookie_extracts() {
        let provider = MockProvider::new().with_user("user@example.com", "password123");
        let session = provider
            .sign_in_with_password(&Credentials::new("user@example.com", "password123"))
            .await
            .unwrap();

        let response = app(provider)
            .oneshot(
                Request::get("/account")
                    .header(
                        "cookie",
                        format!("sb-auth-token={}", cookies::encode_session(&session)),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, session.user.id.as_bytes());
    }

    #[tokio::test]
    async fn optional_session_never_rejects() {
        let response = app(MockProvider::new())
            .oneshot(
                Request::get("/maybe")
                    .header("cookie", "sb-auth-token=garbage")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }
}
