use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Auth errors for the authgate_auth crate.
///
/// This wraps the core `AuthError` and adds crate-specific error variants
/// for I/O operations that can't be in the functional core.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Error from the core auth module (provider rejections, validation).
    #[error(transparent)]
    Core(#[from] authgate_core::auth::AuthError),

    /// HTTP client error talking to the provider
    #[error("HTTP error: {0}")]
    Http(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Core(authgate_core::auth::AuthError::Network(err.to_string()))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        use authgate_core::auth::AuthError as CoreError;

        let (status, message) = match &self {
            AuthError::Core(core_err) => match core_err {
                CoreError::MissingField(_) | CoreError::PasswordMismatch => {
                    (StatusCode::BAD_REQUEST, self.to_string())
                }
                CoreError::InvalidCredentials
                | CoreError::EmailNotConfirmed
                | CoreError::SessionExpired
                | CoreError::SessionNotFound => (StatusCode::UNAUTHORIZED, self.to_string()),
                CoreError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
                CoreError::Provider { .. } | CoreError::Network(_) => {
                    tracing::error!("Auth provider error: {}", self);
                    (
                        StatusCode::BAD_GATEWAY,
                        "Authentication provider error".to_string(),
                    )
                }
                CoreError::Storage(_) => {
                    tracing::error!("Auth error: {}", self);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
            AuthError::Http(_) => {
                tracing::error!("HTTP error during auth: {}", self);
                (
                    StatusCode::BAD_GATEWAY,
                    "Authentication provider error".to_string(),
                )
            }
            AuthError::Config(_) => {
                tracing::error!("Config error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server configuration error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authgate_core::auth::AuthError as CoreError;

    #[test]
    fn status_mapping() {
        let cases = [
            (AuthError::from(CoreError::MissingField("email")), StatusCode::BAD_REQUEST),
            (AuthError::from(CoreError::InvalidCredentials), StatusCode::UNAUTHORIZED),
            (AuthError::from(CoreError::RateLimited), StatusCode::TOO_MANY_REQUESTS),
            (AuthError::from(CoreError::Network("down".into())), StatusCode::BAD_GATEWAY),
            (AuthError::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
