use chrono::{DateTime, Duration, Utc};

use super::Session;

/// Access tokens this close to expiry are refreshed before use.
pub const EXPIRY_MARGIN_SECS: i64 = 10;

/// Whether the access token should be exchanged before it is used.
pub fn needs_refresh(session: &Session, now: DateTime<Utc>) -> bool {
    session.expires_at <= now + Duration::seconds(EXPIRY_MARGIN_SECS)
}

/// Compute the absolute expiry of a token from the provider's `expires_in`.
///
/// GoTrue sends `expires_at` as a unix timestamp on newer versions; when it
/// is present it wins over the relative value.
pub fn resolve_expiry(
    now: DateTime<Utc>,
    expires_in: i64,
    expires_at: Option<i64>,
) -> DateTime<Utc> {
    expires_at
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .unwrap_or_else(|| now + Duration::seconds(expires_in))
}

/// Extract username from email if no name provided.
pub fn email_to_name(email: &str) -> String {
    match email.split('@').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "User".to_string(),
    }
}
