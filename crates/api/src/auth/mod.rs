//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- access/refresh token issuance and verification.

pub mod jwt;
pub mod password;
