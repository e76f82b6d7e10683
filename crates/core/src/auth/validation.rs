use super::{AuthError, Credentials};

/// Validates a `redirectTo` target so it can only point back into this site.
///
/// Returns `Some(path)` for a same-site relative path, `None` otherwise.
///
/// Rejected:
/// - anything not starting with a single `/`
/// - protocol-relative targets (`//evil.com`, and `/\evil.com`, which
///   browsers normalize to the same thing)
/// - control characters
/// - embedded schemes (`://`)
///
/// # Examples
///
/// ```
/// use authgate_core::auth::validate_redirect_to;
///
/// assert_eq!(validate_redirect_to("/protected"), Some("/protected"));
/// assert_eq!(validate_redirect_to("//evil.com"), None);
/// assert_eq!(validate_redirect_to("https://evil.com"), None);
/// ```
pub fn validate_redirect_to(target: &str) -> Option<&str> {
    if !target.starts_with('/') {
        return None;
    }

    if target.starts_with("//") || target.starts_with("/\\") {
        return None;
    }

    if target.chars().any(|c| c.is_control()) {
        return None;
    }

    if target.contains("://") {
        return None;
    }

    Some(target)
}

/// Presence checks for a sign-in submit.
///
/// The e-mail is trimmed; the password is taken as typed. Format checks are
/// left to the provider.
pub fn validate_credentials(email: &str, password: &str) -> Result<Credentials, AuthError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AuthError::MissingField("email"));
    }
    if password.is_empty() {
        return Err(AuthError::MissingField("password"));
    }
    Ok(Credentials::new(email, password))
}

/// Presence checks for a sign-up submit, plus the repeated password.
pub fn validate_sign_up(
    email: &str,
    password: &str,
    repeat_password: &str,
) -> Result<Credentials, AuthError> {
    let credentials = validate_credentials(email, password)?;
    if credentials.password != repeat_password {
        return Err(AuthError::PasswordMismatch);
    }
    Ok(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_relative_paths() {
        assert_eq!(validate_redirect_to("/protected"), Some("/protected"));
        assert_eq!(validate_redirect_to("/"), Some("/"));
        assert_eq!(
            validate_redirect_to("/protected/notes?tab=1#top"),
            Some("/protected/notes?tab=1#top")
        );
    }

    #[test]
    fn rejects_absolute_and_protocol_relative_urls() {
        assert_eq!(validate_redirect_to("https://evil.com"), None);
        assert_eq!(validate_redirect_to("//evil.com/path"), None);
        assert_eq!(validate_redirect_to("/\\evil.com"), None);
        assert_eq!(validate_redirect_to("javascript:alert(1)"), None);
        assert_eq!(validate_redirect_to("protected"), None);
        assert_eq!(validate_redirect_to(""), None);
    }

    #[test]
    fn rejects_control_characters() {
        assert_eq!(validate_redirect_to("/path\r\nSet-Cookie: x"), None);
        assert_eq!(validate_redirect_to("/path\0"), None);
    }

    #[test]
    fn rejects_embedded_scheme() {
        assert_eq!(validate_redirect_to("/go?to=https://evil.com"), None);
        assert_eq!(
            validate_redirect_to("/proxy?host=localhost:8080"),
            Some("/proxy?host=localhost:8080")
        );
    }

    #[test]
    fn credentials_require_both_fields() {
        assert_eq!(
            validate_credentials("   ", "secret").unwrap_err(),
            AuthError::MissingField("email")
        );
        assert_eq!(
            validate_credentials("user@example.com", "").unwrap_err(),
            AuthError::MissingField("password")
        );
    }

    #[test]
    fn credentials_trim_email_but_not_password() {
        let creds = validate_credentials("  user@example.com ", " pw ").unwrap();
        assert_eq!(creds.email, "user@example.com");
        assert_eq!(creds.password, " pw ");
    }

    #[test]
    fn sign_up_requires_matching_passwords() {
        assert_eq!(
            validate_sign_up("user@example.com", "one", "two").unwrap_err(),
            AuthError::PasswordMismatch
        );
        assert!(validate_sign_up("user@example.com", "same", "same").is_ok());
    }
}
