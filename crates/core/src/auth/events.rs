use serde::{Deserialize, Serialize};

use super::AuthEvent;

/// What a page should do after a session change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Reaction {
    /// Re-render with fresh session state.
    Refresh,
    /// Refresh and go to the login page.
    NavigateToLogin { to: String },
}

/// Map a notification to the page reaction.
///
/// Only sign-in and sign-out are acted on; token refreshes are silent.
pub fn reaction_for(event: &AuthEvent, login_path: &str) -> Option<Reaction> {
    match event {
        AuthEvent::SignedIn { .. } => Some(Reaction::Refresh),
        AuthEvent::SignedOut { .. } => Some(Reaction::NavigateToLogin {
            to: login_path.to_string(),
        }),
        AuthEvent::TokenRefreshed { .. } => None,
    }
}
