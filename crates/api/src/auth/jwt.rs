//! HS256 access and refresh tokens.
//!
//! Both kinds carry the same [`Claims`] payload and differ in their signing
//! secret, their lifetime, and the `typ` claim. Verification fails closed:
//! a bad signature, an expired token (no leeway), a malformed payload, or a
//! token of the other kind is rejected without returning any claims.

use chrono::Utc;
use crm_core::roles::Role;
use crm_core::types::{DbId, Scopes};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{parsed, required, ConfigError};
use crate::middleware::auth::AuthUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims embedded in every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The user's internal database id.
    pub sub: DbId,
    pub role: Role,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub scopes: Scopes,
    pub typ: TokenKind,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id (UUID v4).
    pub jti: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            user_id: claims.sub,
            role: claims.role,
            permissions: claims.permissions,
            scopes: claims.scopes,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("expected a {expected:?} token, got {found:?}")]
    WrongKind { expected: TokenKind, found: TokenKind },
}

/// Secrets and lifetimes for both token kinds.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_expiry_mins: i64,
    pub refresh_expiry_days: i64,
}

impl JwtConfig {
    /// | Env Var                   | Required | Default |
    /// |---------------------------|----------|---------|
    /// | `JWT_ACCESS_SECRET`       | **yes**  | --      |
    /// | `JWT_REFRESH_SECRET`      | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS`  | no       | `15`    |
    /// | `JWT_REFRESH_EXPIRY_DAYS` | no       | `7`     |
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let access_secret = required(&lookup, "JWT_ACCESS_SECRET")?;
        let refresh_secret = required(&lookup, "JWT_REFRESH_SECRET")?;
        if access_secret == refresh_secret {
            return Err(ConfigError::SharedJwtSecret);
        }
        Ok(Self {
            access_secret,
            refresh_secret,
            access_expiry_mins: parsed(&lookup, "JWT_ACCESS_EXPIRY_MINS", 15)?,
            refresh_expiry_days: parsed(&lookup, "JWT_REFRESH_EXPIRY_DAYS", 7)?,
        })
    }

    fn secret(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => self.access_secret.as_bytes(),
            TokenKind::Refresh => self.refresh_secret.as_bytes(),
        }
    }

    /// Lifetime of a token of this kind, in seconds.
    pub fn lifetime_secs(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_expiry_mins * 60,
            TokenKind::Refresh => self.refresh_expiry_days * 24 * 60 * 60,
        }
    }
}

/// Access + refresh token pair returned by login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Sign a token of `kind` for `user`.
pub fn issue(kind: TokenKind, user: &AuthUser, config: &JwtConfig) -> Result<String, TokenError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.user_id,
        role: user.role,
        permissions: user.permissions.clone(),
        scopes: user.scopes.clone(),
        typ: kind,
        iat: now,
        exp: now + config.lifetime_secs(kind),
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret(kind)),
    )
    .map_err(TokenError::Encode)
}

/// Verify a token of `kind` and return its claims.
pub fn verify(kind: TokenKind, token: &str, config: &JwtConfig) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    // `sub` is numeric, and jsonwebtoken only counts string subjects as present.
    validation.set_required_spec_claims(&["exp"]);

    let claims = decode::<Claims>(token, &DecodingKey::from_secret(config.secret(kind)), &validation)
        .map_err(TokenError::Invalid)?
        .claims;

    if claims.typ != kind {
        return Err(TokenError::WrongKind {
            expected: kind,
            found: claims.typ,
        });
    }
    Ok(claims)
}

/// Issue a fresh access + refresh pair.
pub fn issue_pair(user: &AuthUser, config: &JwtConfig) -> Result<TokenPair, TokenError> {
    Ok(TokenPair {
        access_token: issue(TokenKind::Access, user, config)?,
        refresh_token: issue(TokenKind::Refresh, user, config)?,
        token_type: "Bearer",
        expires_in: config.lifetime_secs(TokenKind::Access),
    })
}
