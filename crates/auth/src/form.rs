//! Server-side model of the sign-in and sign-up forms.

use authgate_core::auth::{
    user_message, validate_credentials, validate_redirect_to, validate_sign_up, AuthError,
    AuthProvider, Session, SignUpOutcome,
};

/// What the HTTP layer should do after a submit.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Signed in: set the session cookie and go to `to`.
    Navigate { to: String, session: Session },
    /// Signed up, but the provider mailed a confirmation link first.
    ConfirmEmail,
    /// Re-render the form; `AuthForm::error` holds the message.
    Failed,
}

/// Form state: what was typed, what went wrong, whether a submit is running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthForm {
    pub email: String,
    pub error: Option<String>,
    pub loading: bool,
}

impl AuthForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sign in with e-mail and password.
    ///
    /// `redirect_to` is the requested return target; it is used only if it
    /// is a same-site path, otherwise `default_redirect` applies.
    pub async fn submit(
        &mut self,
        provider: &dyn AuthProvider,
        email: &str,
        password: &str,
        redirect_to: Option<&str>,
        default_redirect: &str,
    ) -> SubmitOutcome {
        self.begin(email);

        let outcome = match validate_credentials(email, password) {
            Ok(credentials) => provider
                .sign_in_with_password(&credentials)
                .await
                .map(|session| SubmitOutcome::Navigate {
                    to: return_target(redirect_to, default_redirect),
                    session,
                }),
            Err(err) => Err(err),
        };

        self.finish(outcome)
    }

    /// Register with e-mail and password. `email_redirect_to` is where the
    /// confirmation link should land.
    pub async fn submit_sign_up(
        &mut self,
        provider: &dyn AuthProvider,
        email: &str,
        password: &str,
        repeat_password: &str,
        email_redirect_to: Option<&str>,
        default_redirect: &str,
    ) -> SubmitOutcome {
        self.begin(email);

        let outcome = match validate_sign_up(email, password, repeat_password) {
            Ok(credentials) => provider
                .sign_up(&credentials, email_redirect_to)
                .await
                .map(|outcome| match outcome {
                    SignUpOutcome::SignedIn(session) => SubmitOutcome::Navigate {
                        to: default_redirect.to_string(),
                        session,
                    },
                    SignUpOutcome::ConfirmationRequired(_) => SubmitOutcome::ConfirmEmail,
                }),
            Err(err) => Err(err),
        };

        self.finish(outcome)
    }

    fn begin(&mut self, email: &str) {
        self.email = email.trim().to_string();
        self.error = None;
        self.loading = true;
    }

    fn finish(&mut self, outcome: Result<SubmitOutcome, AuthError>) -> SubmitOutcome {
        self.loading = false;
        match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::debug!(email = %self.email, error = %err, "auth form submit failed");
                self.error = Some(user_message(&err));
                SubmitOutcome::Failed
            }
        }
    }
}

/// The validated return target, or the default.
pub fn return_target(redirect_to: Option<&str>, default_redirect: &str) -> String {
    redirect_to
        .and_then(validate_redirect_to)
        .unwrap_or(default_redirect)
        .to_string()
}
