//! SSE endpoint for auth-state notifications.
//!
//! Each open page subscribes for its signed-in user. A sign-in elsewhere
//! tells the page to re-render (`event: refresh`); a sign-out sends it to the
//! login page (`event: navigate`, data = login path) and ends the stream.

use std::convert::Infallible;

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};

use authgate_auth::OptionalSession;
use authgate_core::auth::Reaction;

use crate::state::AppState;

fn to_event(reaction: &Reaction) -> Event {
    match reaction {
        Reaction::Refresh => Event::default().event("refresh").data(""),
        Reaction::NavigateToLogin { to } => Event::default().event("navigate").data(to),
    }
}

/// GET /auth/events
///
/// 401 without a session; otherwise a stream that lives until sign-out,
/// client disconnect, server shutdown or the configured maximum duration.
pub async fn auth_events(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
) -> Response {
    let Some(session) = session else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let user_id = session.user.id;
    let login_path = state.auth.config.login_path.clone();
    let max_duration = state.config.events_max_duration();
    let mut shutdown_rx = state.subscribe_shutdown();
    // Dropped together with the stream, which releases the channel.
    let mut subscription = state.auth.events.subscribe(&user_id);

    tracing::debug!(user_id = %user_id, "auth event stream opened");

    let stream = async_stream::stream! {
        let deadline = tokio::time::sleep(max_duration);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                reaction = subscription.next_reaction(&login_path) => {
                    let Some(reaction) = reaction else { break };
                    let done = matches!(reaction, Reaction::NavigateToLogin { .. });
                    yield Ok::<_, Infallible>(to_event(&reaction));
                    if done {
                        break;
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("auth event stream received shutdown signal");
                    break;
                }
                _ = &mut deadline => {
                    tracing::info!("auth event stream exceeded max duration, closing");
                    break;
                }
            }
        }
    };

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reactions_map_to_named_events() {
        // Event has no accessors; its wire form is checked through Debug.
        let navigate = format!(
            "{:?}",
            to_event(&Reaction::NavigateToLogin {
                to: "/auth/login".to_string()
            })
        );
        assert!(navigate.contains("navigate"));
        assert!(navigate.contains("/auth/login"));

        let refresh = format!("{:?}", to_event(&Reaction::Refresh));
        assert!(refresh.contains("refresh"));
    }
}
