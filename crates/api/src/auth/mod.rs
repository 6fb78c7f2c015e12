//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- Bearer token generation and validation.

pub mod jwt;
pub mod password;
