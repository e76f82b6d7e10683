//! Profile store implementations.
//!
//! - `PostgrestProfiles`: reads the `profiles` table through the provider's
//!   REST interface, scoped to the caller's access token.
//! - `InMemoryProfiles`: HashMap-backed store for development and tests.

#[cfg(any(test, feature = "mock"))]
mod inmemory;
mod postgrest;

#[cfg(any(test, feature = "mock"))]
pub use inmemory::InMemoryProfiles;
pub use postgrest::PostgrestProfiles;
