//! Server-rendered pages.

use axum::{extract::State, response::Html};

use authgate_auth::{
    templates::{auth_events_script, html_escape, layout},
    CurrentSession, OptionalSession, LOGOUT_PATH, SIGN_UP_PATH,
};
use authgate_core::auth::{email_to_name, Profile};

use crate::state::AppState;

/// Path of the auth notification stream.
pub const EVENTS_PATH: &str = "/auth/events";

fn logout_form() -> String {
    format!(
        r#"<form method="post" action="{LOGOUT_PATH}"><button type="submit">Logout</button></form>"#
    )
}

/// Handler for GET /
pub async fn index(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
) -> Html<String> {
    let config = &state.auth.config;

    let body = match session.as_ref().and_then(|s| s.user.email.as_deref()) {
        Some(email) => format!(
            r#"        <h1>Hey, {name}!</h1>
        <p class="muted">Signed in as {email}</p>
        <p><a href="{protected}">Go to the protected page</a></p>
        {logout}
{script}"#,
            name = html_escape(&email_to_name(email)),
            email = html_escape(email),
            protected = html_escape(&config.default_redirect),
            logout = logout_form(),
            script = auth_events_script(EVENTS_PATH),
        ),
        None if session.is_some() => format!(
            r#"        <h1>Welcome back</h1>
        <p><a href="{protected}">Go to the protected page</a></p>
        {logout}"#,
            protected = html_escape(&config.default_redirect),
            logout = logout_form(),
        ),
        None => format!(
            r#"        <h1>Welcome</h1>
        <p>Sign in to see the protected page.</p>
        <p><a href="{login}">Login</a> or <a href="{sign_up}">Sign up</a></p>"#,
            login = html_escape(&config.login_path),
            sign_up = SIGN_UP_PATH,
        ),
    };

    Html(layout("authgate", &body))
}

fn profile_details(profile: &Profile) -> String {
    let rows: Vec<String> = [
        ("Name", profile.full_name.as_deref()),
        ("Username", profile.username.as_deref()),
        ("Avatar", profile.avatar_url.as_deref()),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        value.map(|v| format!("<dt>{label}</dt><dd>{}</dd>", html_escape(v)))
    })
    .collect();

    format!("<h2>Profile</h2>\n        <dl>{}</dl>", rows.join(""))
}

/// Handler for GET /protected
///
/// The guard already redirected anonymous requests; the extractor checks
/// again. The profile is optional: a failed lookup is logged and the page
/// renders without it.
pub async fn protected_page(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Html<String> {
    let profile = match state
        .auth
        .profiles
        .get_profile(&session.user.id, &session.access_token)
        .await
    {
        Ok(profile) => profile,
        Err(err) => {
            tracing::warn!(user_id = %session.user.id, error = %err, "profile lookup failed");
            None
        }
    };

    let email = session.user.email.as_deref().unwrap_or("(no email)");
    let body = format!(
        r#"        <p class="muted">This is a protected page that you can only see as an authenticated user</p>
        <h1>Your user details</h1>
        <p>Email: <strong>{email}</strong></p>
        {profile}
        {logout}
{script}"#,
        email = html_escape(email),
        profile = profile.as_ref().map(profile_details).unwrap_or_default(),
        logout = logout_form(),
        script = auth_events_script(EVENTS_PATH),
    );

    Html(layout("Protected", &body))
}
