use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("email not confirmed")]
    EmailNotConfirmed,

    #[error("session expired")]
    SessionExpired,

    #[error("session not found")]
    SessionNotFound,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("too many requests")]
    RateLimited,

    #[error("provider error ({status}): {message}")]
    Provider {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// Classify a provider error response.
    ///
    /// GoTrue reports machine-readable codes in `error_code` on recent
    /// versions and only a message on older ones, so both are consulted.
    pub fn from_provider(status: u16, code: Option<&str>, message: &str) -> Self {
        match code {
            Some("invalid_credentials") => return Self::InvalidCredentials,
            Some("email_not_confirmed") => return Self::EmailNotConfirmed,
            Some("session_not_found")
            | Some("session_expired")
            | Some("refresh_token_not_found")
            | Some("refresh_token_already_used") => return Self::SessionExpired,
            Some("over_request_rate_limit") | Some("over_email_send_rate_limit") => {
                return Self::RateLimited
            }
            _ => {}
        }

        let lowered = message.to_ascii_lowercase();
        if lowered.contains("invalid login credentials") {
            Self::InvalidCredentials
        } else if lowered.contains("email not confirmed") {
            Self::EmailNotConfirmed
        } else if status == 429 {
            Self::RateLimited
        } else {
            Self::Provider {
                status,
                code: code.map(String::from),
                message: message.to_string(),
            }
        }
    }

    /// Whether this error means the caller simply has no usable session.
    pub fn is_unauthenticated(&self) -> bool {
        match self {
            Self::SessionExpired | Self::SessionNotFound => true,
            Self::Provider { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_takes_precedence_over_message() {
        let err = AuthError::from_provider(400, Some("invalid_credentials"), "whatever");
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[test]
    fn legacy_message_is_classified() {
        let err = AuthError::from_provider(400, None, "Invalid login credentials");
        assert_eq!(err, AuthError::InvalidCredentials);

        let err = AuthError::from_provider(400, None, "Email not confirmed");
        assert_eq!(err, AuthError::EmailNotConfirmed);
    }

    #[test]
    fn rejected_refresh_token_is_an_expired_session() {
        let err = AuthError::from_provider(
            400,
            Some("refresh_token_not_found"),
            "Invalid Refresh Token: Refresh Token Not Found",
        );
        assert_eq!(err, AuthError::SessionExpired);
        assert!(err.is_unauthenticated());
    }

    #[test]
    fn status_429_is_rate_limited() {
        let err = AuthError::from_provider(429, None, "slow down");
        assert_eq!(err, AuthError::RateLimited);
    }

    #[test]
    fn unknown_errors_keep_provider_details() {
        let err = AuthError::from_provider(422, Some("weak_password"), "Password too short");
        assert_eq!(
            err,
            AuthError::Provider {
                status: 422,
                code: Some("weak_password".to_string()),
                message: "Password too short".to_string(),
            }
        );
    }

    #[test]
    fn unauthenticated_classification() {
        assert!(AuthError::SessionExpired.is_unauthenticated());
        assert!(AuthError::from_provider(401, Some("bad_jwt"), "invalid JWT").is_unauthenticated());
        assert!(!AuthError::InvalidCredentials.is_unauthenticated());
        assert!(!AuthError::Network("timeout".into()).is_unauthenticated());
    }
}
