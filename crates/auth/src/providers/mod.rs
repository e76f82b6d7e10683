//! Auth provider implementations.
//!
//! This module contains implementations of `AuthProvider` for:
//! - Supabase (GoTrue over HTTP)
//! - An in-memory mock for development and tests

#[cfg(any(test, feature = "mock"))]
mod mock;
mod supabase;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockProvider;
pub use supabase::SupabaseProvider;
