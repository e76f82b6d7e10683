//! GoTrue (Supabase Auth) HTTP provider.
//!
//! Talks to the REST endpoints under `/auth/v1`. Every request carries the
//! project's public key in the `apikey` header; user-scoped requests add the
//! caller's access token as a bearer token.

use async_trait::async_trait;
use authgate_core::auth::{
    resolve_expiry, AuthError, AuthProvider, Credentials, EmailOtpType, Result, Session,
    SessionUser, SignUpOutcome,
};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::error::AuthError as ShellError;

/// Token endpoint response (`/token`, `/verify`, auto-confirmed `/signup`).
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: GoTrueUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: resolve_expiry(Utc::now(), self.expires_in, self.expires_at),
            user: self.user.into(),
        }
    }
}

#[derive(Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<GoTrueUser> for SessionUser {
    fn from(user: GoTrueUser) -> Self {
        SessionUser::new(user.id, user.email)
    }
}

/// Error body. GoTrue has used several shapes over time.
#[derive(Debug, Default, Deserialize)]
struct GoTrueErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

impl GoTrueErrorResponse {
    fn message(&self) -> &str {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
            .unwrap_or("Unknown error")
    }

    fn code(&self) -> Option<&str> {
        self.error_code.as_deref().or(self.error.as_deref())
    }
}

/// Auth provider backed by a Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseProvider {
    http: reqwest::Client,
    base_url: Url,
}

impl SupabaseProvider {
    /// Create a provider for the project at `supabase_url`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the key is not a valid header value or the URL
    /// cannot be extended with `/auth/v1`.
    pub fn new(supabase_url: &Url, anon_key: &str) -> std::result::Result<Self, ShellError> {
        let base = supabase_url.as_str().trim_end_matches('/');
        let base_url = Url::parse(&format!("{base}/auth/v1"))
            .map_err(|e| ShellError::Config(format!("invalid auth URL: {e}")))?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            "apikey",
            HeaderValue::from_str(anon_key)
                .map_err(|e| ShellError::Config(format!("invalid API key header: {e}")))?,
        );
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(default_headers)
            .build()
            .map_err(|e| ShellError::Http(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    /// Build an endpoint URL; `path` may carry a query string.
    fn url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let current = url.path().to_string();
        match path.split_once('?') {
            Some((p, query)) => {
                url.set_path(&format!("{current}{p}"));
                url.set_query(Some(query));
            }
            None => url.set_path(&format!("{current}{path}")),
        }
        url
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let resp = request.send().await.map_err(network)?;
        let status = resp.status().as_u16();
        if status >= 400 {
            return Err(parse_error(status, resp).await);
        }
        Ok(resp)
    }

    async fn session_from(&self, request: reqwest::RequestBuilder) -> Result<Session> {
        let resp = self.send(request).await?;
        let status = resp.status().as_u16();
        let body: TokenResponse = resp.json().await.map_err(|e| unexpected(status, e))?;
        Ok(body.into_session())
    }
}

fn network(err: reqwest::Error) -> AuthError {
    AuthError::Network(err.to_string())
}

fn unexpected(status: u16, err: impl std::fmt::Display) -> AuthError {
    AuthError::Provider {
        status,
        code: None,
        message: format!("unexpected response body: {err}"),
    }
}

async fn parse_error(status: u16, resp: reqwest::Response) -> AuthError {
    let body = resp.json::<GoTrueErrorResponse>().await.unwrap_or_default();
    let message = match body.message() {
        "Unknown error" => format!("HTTP {status}"),
        other => other.to_string(),
    };
    AuthError::from_provider(status, body.code(), &message)
}

#[async_trait]
impl AuthProvider for SupabaseProvider {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session> {
        let body = json!({
            "email": credentials.email,
            "password": credentials.password,
        });
        let url = self.url("/token?grant_type=password");
        self.session_from(self.http.post(url).json(&body)).await
    }

    async fn sign_up(
        &self,
        credentials: &Credentials,
        email_redirect_to: Option<&str>,
    ) -> Result<SignUpOutcome> {
        let body = json!({
            "email": credentials.email,
            "password": credentials.password,
        });
        let mut url = self.url("/signup");
        if let Some(target) = email_redirect_to {
            url.query_pairs_mut().append_pair("redirect_to", target);
        }

        let resp = self.send(self.http.post(url).json(&body)).await?;
        let status = resp.status().as_u16();
        let body: Value = resp.json().await.map_err(|e| unexpected(status, e))?;

        // Auto-confirmed projects answer with a full token response; otherwise
        // the bare user comes back (nested under `user` on some versions).
        if body.get("access_token").is_some() {
            let tokens: TokenResponse =
                serde_json::from_value(body).map_err(|e| unexpected(status, e))?;
            return Ok(SignUpOutcome::SignedIn(tokens.into_session()));
        }

        let user_value = match body.get("user") {
            Some(user) => user.clone(),
            None => body,
        };
        let user: GoTrueUser =
            serde_json::from_value(user_value).map_err(|e| unexpected(status, e))?;
        Ok(SignUpOutcome::ConfirmationRequired(user.into()))
    }

    async fn get_user(&self, access_token: &str) -> Result<SessionUser> {
        let url = self.url("/user");
        let resp = self.send(self.http.get(url).bearer_auth(access_token)).await?;
        let status = resp.status().as_u16();
        let user: GoTrueUser = resp.json().await.map_err(|e| unexpected(status, e))?;
        Ok(user.into())
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        let body = json!({ "refresh_token": refresh_token });
        let url = self.url("/token?grant_type=refresh_token");
        self.session_from(self.http.post(url).json(&body)).await
    }

    async fn verify_otp(&self, token_hash: &str, otp_type: EmailOtpType) -> Result<Session> {
        let body = json!({
            "type": otp_type.to_string(),
            "token_hash": token_hash,
        });
        let url = self.url("/verify");
        self.session_from(self.http.post(url).json(&body)).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let url = self.url("/logout?scope=global");
        self.send(self.http.post(url).bearer_auth(access_token))
            .await
            .map(|_| ())
    }
}
