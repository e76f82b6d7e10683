//! Functional core for authgate.
//!
//! Everything in here is free of I/O: session and event types, the error
//! taxonomy, the route-guard predicate, input validation and the
//! translation of provider errors into user-facing messages. The HTTP
//! shell lives in `authgate_auth`.

pub mod auth;
