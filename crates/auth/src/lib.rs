//! Supabase-backed authentication for authgate.
//!
//! This crate provides:
//! - A GoTrue HTTP provider and an in-memory mock (feature `mock`)
//! - Cookie-stored sessions, re-validated and refreshed on every request
//! - A route guard middleware and axum extractors
//! - The sign-in / sign-up form model and auth routes
//! - Per-user session-change notifications

mod accessor;
mod config;
mod cookies;
mod error;
mod extractors;
mod form;
mod handlers;
mod listener;
mod middleware;
mod profiles;
mod providers;
mod state;
pub mod templates;

pub use accessor::{CookieUpdate, SessionLookup};
pub use config::AuthConfig;
pub use cookies::{clear_session, decode_session, encode_session, set_session};
pub use error::AuthError;
pub use extractors::{CurrentSession, OptionalSession};
pub use form::{return_target, AuthForm, SubmitOutcome};
pub use handlers::{auth_routes, LOGOUT_PATH, SIGN_UP_PATH};
pub use listener::{AuthEvents, AuthSubscription};
pub use middleware::{route_guard, ResolvedSession};
#[cfg(any(test, feature = "mock"))]
pub use profiles::InMemoryProfiles;
pub use profiles::PostgrestProfiles;
#[cfg(any(test, feature = "mock"))]
pub use providers::MockProvider;
pub use providers::SupabaseProvider;
pub use state::AuthState;
