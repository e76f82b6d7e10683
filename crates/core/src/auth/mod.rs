mod error;
mod events;
mod functions;
mod guard;
mod messages;
mod traits;
mod types;
mod validation;

pub use error::AuthError;
pub use events::{reaction_for, Reaction};
pub use functions::{email_to_name, needs_refresh, resolve_expiry, EXPIRY_MARGIN_SECS};
pub use guard::{
    evaluate_route, is_static_asset, login_redirect, GuardDecision, ProtectedPaths,
    REDIRECT_PARAM,
};
pub use messages::user_message;
pub use traits::{AuthProvider, ProfileRepository, Result};
pub use types::{
    AuthEvent, Credentials, EmailOtpType, Profile, Session, SessionUser, SignUpOutcome,
};
pub use validation::{validate_credentials, validate_redirect_to, validate_sign_up};
