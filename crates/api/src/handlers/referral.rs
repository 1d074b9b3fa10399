//! Handlers for the `/referrals` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use crm_core::audit::{actions, entities};
use crm_core::pagination::{Page, PageRequest};
use crm_core::roles::permissions;
use crm_db::models::audit::CreateAuditLog;
use crm_db::models::referral::{CreateReferral, Referral, ReferralStats};
use crm_db::repositories::ReferralRepo;

use super::CursorParams;
use crate::audit::snapshot;
use crate::error::AppResult;
use crate::extract::{CorrelationId, ValidatedJson, ValidatedQuery};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /referrals
///
/// Codes are globally unique; a taken code is a 409 and the existing row is
/// left untouched.
pub async fn create_referral(
    auth: AuthUser,
    State(state): State<AppState>,
    correlation: CorrelationId,
    ValidatedJson(input): ValidatedJson<CreateReferral>,
) -> AppResult<(StatusCode, Json<DataResponse<Referral>>)> {
    let referral = ReferralRepo::create(&state.pool, auth.user_id, &input.code).await?;

    state.audit.record(
        CreateAuditLog::new(actions::REFERRAL_CREATE, entities::REFERRAL)
            .actor(auth.user_id)
            .entity_id(referral.id)
            .after(snapshot(&referral))
            .correlation_id(correlation.into_inner()),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: referral })))
}

/// GET /referrals
pub async fn list_referrals(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<CursorParams>,
) -> AppResult<Json<Page<Referral>>> {
    let page = PageRequest::parse(params.limit, params.cursor.as_deref())?;
    let rows = ReferralRepo::list_for_owner(&state.pool, auth.user_id, &page).await?;
    Ok(Json(Page::from_rows(rows, &page)))
}

/// GET /referrals/stats
///
/// Callers with `referrals:stats:all` (admins included) see every owner;
/// everyone else sees their own count.
pub async fn referral_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ReferralStats>>>> {
    let owner = if auth.has_permission(permissions::REFERRALS_STATS_ALL) {
        None
    } else {
        Some(auth.user_id)
    };
    let stats = ReferralRepo::stats(&state.pool, owner).await?;
    Ok(Json(DataResponse { data: stats }))
}
