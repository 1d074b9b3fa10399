//! Handlers for the `/auth` resource (login, refresh, me).

use axum::extract::State;
use axum::Json;
use crm_core::audit::{actions, entities};
use crm_core::error::CoreError;
use crm_db::models::audit::CreateAuditLog;
use crm_db::models::user::User;
use crm_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::{issue_pair, verify, TokenKind, TokenPair};
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::extract::{CorrelationId, ValidatedJson};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "Invalid email or password";

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// Returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: User,
}

fn issue_for(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let principal = AuthUser::from_user(&user)?;
    let tokens = issue_pair(&principal, &state.config.jwt)
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    Ok(AuthResponse { tokens, user })
}

/// POST /auth/login
///
/// Unknown emails and wrong passwords get the same 401; a correct password
/// on a deactivated account gets 403.
pub async fn login(
    State(state): State<AppState>,
    correlation: CorrelationId,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = UserRepo::find_by_email(&state.pool, &input.email)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized(BAD_CREDENTIALS.into())))?;

    let valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !valid {
        tracing::info!(user_id = user.id, "Login failed: wrong password");
        return Err(AppError::Core(CoreError::Unauthorized(BAD_CREDENTIALS.into())));
    }

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    state.audit.record(
        CreateAuditLog::new(actions::AUTH_LOGIN, entities::USER)
            .actor(user.id)
            .entity_id(user.id)
            .correlation_id(correlation.into_inner()),
    );
    tracing::info!(user_id = user.id, role = %user.role, "User logged in");

    Ok(Json(issue_for(&state, user)?))
}

/// POST /auth/refresh
///
/// The user is reloaded so role, permission, and activation changes apply
/// to the new pair.
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let claims = verify(TokenKind::Refresh, &input.refresh_token, &state.config.jwt).map_err(
        |e| {
            tracing::debug!(error = %e, "Rejected refresh token");
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        },
    )?;

    let user = UserRepo::find_by_id(&state.pool, claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Account unavailable".into())))?;

    Ok(Json(issue_for(&state, user)?))
}

/// GET /auth/me
pub async fn me(auth: AuthUser, State(state): State<AppState>) -> AppResult<Json<DataResponse<User>>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("User", auth.user_id)))?;
    Ok(Json(DataResponse { data: user }))
}
