//! Bearer-token authentication.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use crm_core::error::CoreError;
use crm_core::roles::Role;
use crm_core::types::{DbId, Scopes};
use crm_db::models::user::User;

use crate::auth::jwt::{verify, JwtConfig, TokenKind};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// The authenticated principal for one request.
///
/// Inserted into request extensions by [`require_auth`] and usable directly
/// as a handler argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: DbId,
    pub role: Role,
    pub permissions: Vec<String>,
    pub scopes: Scopes,
}

impl AuthUser {
    /// Build the principal for a stored user.
    pub fn from_user(user: &User) -> AppResult<Self> {
        let role = user
            .role
            .parse::<Role>()
            .map_err(|e| AppError::InternalError(format!("user {}: {e}", user.id)))?;
        Ok(Self {
            user_id: user.id,
            role,
            permissions: user.permissions.clone(),
            scopes: user.scopes.0.clone(),
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Admins hold every permission implicitly.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_admin() || self.permissions.iter().any(|p| p == permission)
    }

    pub fn ensure_permission(&self, permission: &str) -> AppResult<()> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::Core(CoreError::Forbidden(format!(
                "Missing permission: {permission}"
            ))))
        }
    }

    /// Owner filter for repository calls: `None` (all rows) for admins,
    /// the caller's own id otherwise.
    pub fn owner_scope(&self) -> Option<DbId> {
        if self.is_admin() {
            None
        } else {
            Some(self.user_id)
        }
    }
}

fn unauthorized(message: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(message.into()))
}

/// Verify the `Authorization: Bearer <access token>` header.
pub fn authenticate(headers: &HeaderMap, jwt: &JwtConfig) -> AppResult<AuthUser> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| unauthorized("Missing Authorization header"))?;

    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            unauthorized("Invalid Authorization format. Expected: Bearer <token>")
        })?;

    let claims = verify(TokenKind::Access, token, jwt).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        unauthorized("Invalid or expired token")
    })?;

    Ok(claims.into())
}

/// Route layer: authenticate, then hand the principal to the handler.
///
/// Short-circuits with 401 before the handler (and any database access)
/// runs.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let user = authenticate(request.headers(), &state.config.jwt)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        authenticate(&parts.headers, &state.config.jwt)
    }
}
