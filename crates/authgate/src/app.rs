use axum::{http::StatusCode, middleware, routing::get, Router};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use authgate_auth::{auth_routes, route_guard};

use crate::{
    handlers::{
        events::auth_events,
        health::livez,
        pages::{index, protected_page, EVENTS_PATH},
    },
    state::AppState,
};

/// Create the application router with all routes and middleware.
///
/// The route guard wraps every route; it decides per path whether a session
/// is required.
pub fn create_app(state: AppState) -> Router {
    let auth = state.auth.clone();

    Router::new()
        .route("/", get(index))
        .route("/protected", get(protected_page))
        .route("/protected/{*rest}", get(protected_page))
        .route(EVENTS_PATH, get(auth_events))
        .route("/livez", get(livez))
        .merge(auth_routes(&auth.config).with_state(auth.clone()))
        .layer(middleware::from_fn_with_state(auth, route_guard))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.request_timeout(),
        ))
        .with_state(state)
}
