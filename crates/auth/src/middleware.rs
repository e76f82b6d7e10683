//! Route guard middleware.
//!
//! Runs once per request, before any handler: resolves the session through
//! the accessor, redirects to the login page when a protected path has no
//! session, and otherwise passes through. The resolved session is left in
//! the request extensions for the extractors, and any cookie update the
//! accessor produced (refreshed or cleared session) is written to the
//! response.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/protected", get(protected_page))
//!     .layer(middleware::from_fn_with_state(auth_state, route_guard));
//! ```

use authgate_core::auth::{evaluate_route, is_static_asset, GuardDecision, Session};
use axum::{
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::accessor::{CookieUpdate, SessionLookup};
use crate::state::AuthState;

/// The session the guard resolved for this request.
#[derive(Debug, Clone)]
pub struct ResolvedSession(pub Option<Session>);

pub async fn route_guard(
    State(state): State<AuthState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let protected = state.config.protected.is_protected(&path);

    // Assets under a protected prefix still resolve the session, since a
    // handler there may need it and a refresh must reach the browser.
    if is_static_asset(&path) && !protected {
        return next.run(request).await;
    }

    let lookup = match state.current_session(&jar).await {
        Ok(lookup) => lookup,
        // The provider could not be asked. Protected content fails closed;
        // public pages render as signed out.
        Err(err) if protected => return err.into_response(),
        Err(err) => {
            tracing::warn!(path = %path, error = %err, "session lookup failed");
            SessionLookup {
                session: None,
                cookie: CookieUpdate::Keep,
            }
        }
    };

    let original = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());

    let decision = evaluate_route(
        &path,
        &original,
        lookup.session.is_some(),
        &state.config.protected,
        &state.config.login_path,
    );

    if let GuardDecision::Unauthorized { redirect_to } = decision {
        tracing::debug!(path = %path, "no session for protected path, redirecting to login");
        let jar = lookup.apply(jar, &state);
        return (jar, Redirect::to(&redirect_to)).into_response();
    }

    request
        .extensions_mut()
        .insert(ResolvedSession(lookup.session.clone()));
    let response = next.run(request).await;

    // A handler that wrote the session cookie itself (sign-in, sign-out)
    // knows better than the lookup made before it ran.
    if sets_cookie(&response, &state.config.cookie_name) {
        return response;
    }
    (lookup.apply(jar, &state), response).into_response()
}

fn sets_cookie(response: &Response, name: &str) -> bool {
    let whole = format!("{name}=");
    let chunk = format!("{name}.");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&whole) || v.starts_with(&chunk))
}
