//! Request extractors for authentication.
//!
//! - [`auth::AuthUser`] -- Resolves the calling user from a bearer token.

pub mod auth;
