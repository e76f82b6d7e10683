//! HTTP handlers for auth routes.

use authgate_core::auth::{user_message, AuthEvent, EmailOtpType, Session, SessionUser};
use axum::{
    extract::{Query, State},
    http::{header::HOST, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;

use crate::config::AuthConfig;
use crate::cookies;
use crate::extractors::OptionalSession;
use crate::form::{return_target, AuthForm, SubmitOutcome};
use crate::templates;
use crate::AuthState;

pub const SIGN_UP_PATH: &str = "/auth/sign-up";
pub const SIGN_UP_SUCCESS_PATH: &str = "/auth/sign-up-success";
pub const CONFIRM_PATH: &str = "/auth/confirm";
pub const ERROR_PATH: &str = "/auth/error";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const ME_PATH: &str = "/auth/me";

/// Query parameters for the login page.
#[derive(Deserialize, Default)]
pub struct LoginQuery {
    /// Path to return to after signing in.
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

#[derive(Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub repeat_password: String,
}

/// Query parameters of the e-mail confirmation link.
#[derive(Deserialize)]
pub struct ConfirmQuery {
    pub token_hash: Option<String>,
    #[serde(rename = "type")]
    pub otp_type: Option<String>,
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct ErrorQuery {
    pub error: Option<String>,
}

/// Creates the auth router with all authentication routes.
///
/// Routes:
/// - `GET /auth/login` - Login form (signed-in users are sent on)
/// - `POST /auth/login` - Sign in with e-mail and password
/// - `GET /auth/sign-up` - Sign-up form
/// - `POST /auth/sign-up` - Register
/// - `GET /auth/sign-up-success` - "Check your email" page
/// - `GET /auth/confirm` - E-mail confirmation link target
/// - `GET /auth/error` - Auth error page
/// - `POST /auth/logout` - End the current session
/// - `GET /auth/me` - Get current authenticated user
///
/// The login route follows `config.login_path`.
pub fn auth_routes(config: &AuthConfig) -> Router<AuthState> {
    Router::new()
        .route(&config.login_path, get(login_page).post(login))
        .route(SIGN_UP_PATH, get(sign_up_page).post(sign_up))
        .route(SIGN_UP_SUCCESS_PATH, get(sign_up_success))
        .route(CONFIRM_PATH, get(confirm))
        .route(ERROR_PATH, get(error_page))
        .route(LOGOUT_PATH, post(logout))
        .route(ME_PATH, get(me))
}

/// Set the session cookie, announce the sign-in and go to `to`.
fn signed_in(state: &AuthState, jar: CookieJar, session: &Session, to: &str) -> Response {
    tracing::info!(user_id = %session.user.id, "user signed in");
    state.events.publish(AuthEvent::SignedIn {
        user: session.user.clone(),
    });
    let jar = cookies::set_session(jar, &state.config, session);
    (jar, Redirect::to(to)).into_response()
}

async fn login_page(
    State(state): State<AuthState>,
    OptionalSession(session): OptionalSession,
    Query(query): Query<LoginQuery>,
) -> Response {
    if session.is_some() {
        let to = return_target(query.redirect_to.as_deref(), &state.config.default_redirect);
        return Redirect::to(&to).into_response();
    }

    Html(templates::login_page(
        &state.config.login_path,
        SIGN_UP_PATH,
        &AuthForm::new(),
        query.redirect_to.as_deref(),
    ))
    .into_response()
}

async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Form(input): Form<LoginForm>,
) -> Response {
    let mut form = AuthForm::new();
    let outcome = form
        .submit(
            state.provider.as_ref(),
            &input.email,
            &input.password,
            input.redirect_to.as_deref(),
            &state.config.default_redirect,
        )
        .await;

    match outcome {
        SubmitOutcome::Navigate { to, session } => signed_in(&state, jar, &session, &to),
        SubmitOutcome::ConfirmEmail | SubmitOutcome::Failed => Html(templates::login_page(
            &state.config.login_path,
            SIGN_UP_PATH,
            &form,
            input.redirect_to.as_deref(),
        ))
        .into_response(),
    }
}

async fn sign_up_page(State(state): State<AuthState>) -> Html<String> {
    Html(templates::sign_up_page(
        SIGN_UP_PATH,
        &state.config.login_path,
        &AuthForm::new(),
    ))
}

/// Absolute URL of the confirmation route, for the link in the e-mail.
fn confirm_url(headers: &HeaderMap, config: &AuthConfig) -> Option<String> {
    let host = headers.get(HOST)?.to_str().ok()?;
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or(if config.cookie_secure { "https" } else { "http" });
    Some(format!("{scheme}://{host}{CONFIRM_PATH}"))
}

async fn sign_up(
    State(state): State<AuthState>,
    jar: CookieJar,
    headers: HeaderMap,
    Form(input): Form<SignUpForm>,
) -> Response {
    let email_redirect_to = confirm_url(&headers, &state.config);

    let mut form = AuthForm::new();
    let outcome = form
        .submit_sign_up(
            state.provider.as_ref(),
            &input.email,
            &input.password,
            &input.repeat_password,
            email_redirect_to.as_deref(),
            &state.config.default_redirect,
        )
        .await;

    match outcome {
        SubmitOutcome::Navigate { to, session } => signed_in(&state, jar, &session, &to),
        SubmitOutcome::ConfirmEmail => {
            tracing::info!(email = %form.email, "sign-up pending e-mail confirmation");
            Redirect::to(SIGN_UP_SUCCESS_PATH).into_response()
        }
        SubmitOutcome::Failed => Html(templates::sign_up_page(
            SIGN_UP_PATH,
            &state.config.login_path,
            &form,
        ))
        .into_response(),
    }
}

async fn sign_up_success() -> Html<String> {
    Html(templates::sign_up_success_page())
}

fn error_redirect(message: &str) -> Response {
    Redirect::to(&format!(
        "{ERROR_PATH}?error={}",
        urlencoding::encode(message)
    ))
    .into_response()
}

async fn confirm(
    State(state): State<AuthState>,
    jar: CookieJar,
    Query(query): Query<ConfirmQuery>,
) -> Response {
    let (Some(token_hash), Some(otp_type)) = (query.token_hash, query.otp_type) else {
        return error_redirect("No token hash or type");
    };
    let Ok(otp_type) = otp_type.parse::<EmailOtpType>() else {
        return error_redirect("Invalid confirmation type");
    };

    match state.provider.verify_otp(&token_hash, otp_type).await {
        Ok(session) => {
            let to = return_target(query.next.as_deref(), "/");
            signed_in(&state, jar, &session, &to)
        }
        Err(err) => {
            tracing::warn!(error = %err, "e-mail confirmation failed");
            error_redirect(&user_message(&err))
        }
    }
}

async fn error_page(State(state): State<AuthState>, Query(query): Query<ErrorQuery>) -> Html<String> {
    Html(templates::error_page(
        query.error.as_deref(),
        &state.config.login_path,
    ))
}

async fn logout(
    State(state): State<AuthState>,
    OptionalSession(session): OptionalSession,
    jar: CookieJar,
) -> Response {
    if let Some(session) = session {
        // Best effort: the local session ends even if the provider call fails.
        if let Err(err) = state.provider.sign_out(&session.access_token).await {
            tracing::warn!(user_id = %session.user.id, error = %err, "provider sign-out failed");
        }
        tracing::info!(user_id = %session.user.id, "user signed out");
        state.events.publish(AuthEvent::SignedOut {
            user_id: session.user.id,
        });
    }

    let jar = cookies::clear_session(jar, &state.config);
    (jar, Redirect::to(&state.config.login_path)).into_response()
}

async fn me(OptionalSession(session): OptionalSession) -> Response {
    match session {
        Some(session) => Json::<SessionUser>(session.user).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "not authenticated" })),
        )
            .into_response(),
    }
}
