use super::AuthError;

/// Translate an auth error into the string shown on the form.
///
/// Known provider failures get a friendlier wording; anything else the
/// provider reports is shown verbatim.
pub fn user_message(error: &AuthError) -> String {
    match error {
        AuthError::InvalidCredentials => "Invalid email or password.".to_string(),
        AuthError::EmailNotConfirmed => {
            "Please confirm your email address before signing in.".to_string()
        }
        AuthError::SessionExpired | AuthError::SessionNotFound => {
            "Your session has expired. Please sign in again.".to_string()
        }
        AuthError::MissingField(field) => format!("Please enter your {field}."),
        AuthError::PasswordMismatch => "Passwords do not match.".to_string(),
        AuthError::RateLimited => {
            "Too many attempts. Please wait a moment and try again.".to_string()
        }
        AuthError::Provider { message, .. } => message.clone(),
        AuthError::Network(_) => {
            "Could not reach the authentication service. Please try again.".to_string()
        }
        AuthError::Storage(_) => "Something went wrong. Please try again.".to_string(),
    }
}
