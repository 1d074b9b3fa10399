//! Request middleware and the authenticated-user extractor.
//!
//! - [`auth::require_auth`] -- rejects requests without a valid access token.
//! - [`auth::AuthUser`] -- the authenticated principal.
//! - [`errors::render_errors`] -- the single place error bodies are written.

pub mod auth;
pub mod errors;
