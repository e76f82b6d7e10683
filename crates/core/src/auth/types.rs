use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The user embedded in a provider session.
///
/// Only the identifier and e-mail are kept. The rest of the provider's user
/// object (metadata, identities) would only grow the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl SessionUser {
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            email,
        }
    }
}

/// Provider-issued token bundle.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: SessionUser,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// E-mail and password pair, held only for the duration of a submit.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Optional profile row looked up by session user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Result of a sign-up call.
///
/// Projects with e-mail confirmation enabled return the user without a
/// session; auto-confirm projects sign the user in immediately.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    SignedIn(Session),
    ConfirmationRequired(SessionUser),
}

/// Kind of one-time password carried by an e-mail confirmation link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailOtpType {
    Signup,
    Invite,
    Magiclink,
    Recovery,
    EmailChange,
    Email,
}

impl std::str::FromStr for EmailOtpType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signup" => Ok(Self::Signup),
            "invite" => Ok(Self::Invite),
            "magiclink" => Ok(Self::Magiclink),
            "recovery" => Ok(Self::Recovery),
            "email_change" => Ok(Self::EmailChange),
            "email" => Ok(Self::Email),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for EmailOtpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Signup => "signup",
            Self::Invite => "invite",
            Self::Magiclink => "magiclink",
            Self::Recovery => "recovery",
            Self::EmailChange => "email_change",
            Self::Email => "email",
        };
        write!(f, "{s}")
    }
}

/// Session-change notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthEvent {
    SignedIn { user: SessionUser },
    SignedOut { user_id: String },
    TokenRefreshed { user: SessionUser },
}

impl AuthEvent {
    /// The user this notification concerns.
    pub fn user_id(&self) -> &str {
        match self {
            Self::SignedIn { user } | Self::TokenRefreshed { user } => &user.id,
            Self::SignedOut { user_id } => user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_secrets() {
        let creds = Credentials::new("user@example.com", "hunter2");
        let out = format!("{creds:?}");
        assert!(out.contains("user@example.com"));
        assert!(!out.contains("hunter2"));

        let session = Session {
            access_token: "access-secret".to_string(),
            refresh_token: "refresh-secret".to_string(),
            expires_at: Utc::now(),
            user: SessionUser::new("u1", None),
        };
        let out = format!("{session:?}");
        assert!(!out.contains("access-secret"));
        assert!(!out.contains("refresh-secret"));
    }

    #[test]
    fn otp_type_parses_known_values() {
        assert_eq!("signup".parse(), Ok(EmailOtpType::Signup));
        assert_eq!("email_change".parse(), Ok(EmailOtpType::EmailChange));
        assert_eq!("bogus".parse::<EmailOtpType>(), Err(()));
        assert_eq!(EmailOtpType::Magiclink.to_string(), "magiclink");
    }

    #[test]
    fn auth_event_serializes_with_tag() {
        let event = AuthEvent::SignedOut {
            user_id: "u1".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "signed_out");
        assert_eq!(event.user_id(), "u1");
    }
}
