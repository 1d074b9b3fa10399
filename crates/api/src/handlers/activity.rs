//! Handlers for the `/activities` resource.
//!
//! Non-admins only see and change activities they own.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use crm_core::audit::{actions, entities};
use crm_core::error::CoreError;
use crm_core::pagination::{Page, PageRequest};
use crm_core::types::DbId;
use crm_db::models::activity::{
    Activity, ActivityFilter, ActivityType, CreateActivity, UpdateActivity,
};
use crm_db::models::audit::CreateAuditLog;
use crm_db::repositories::ActivityRepo;
use serde::Deserialize;
use validator::Validate;

use crate::audit::snapshot;
use crate::error::{AppError, AppResult};
use crate::extract::{CorrelationId, ValidatedJson, ValidatedQuery};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /activities`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ActivityListQuery {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: Option<ActivityType>,
    pub company_id: Option<DbId>,
    pub contact_id: Option<DbId>,
    pub opportunity_id: Option<DbId>,
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::not_found("Activity", id))
}

/// GET /activities
pub async fn list_activities(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<ActivityListQuery>,
) -> AppResult<Json<Page<Activity>>> {
    let page = PageRequest::parse(params.limit, params.cursor.as_deref())?;
    let filter = ActivityFilter {
        activity_type: params.activity_type,
        company_id: params.company_id,
        contact_id: params.contact_id,
        opportunity_id: params.opportunity_id,
    };
    let rows = ActivityRepo::list(&state.pool, auth.owner_scope(), &filter, &page).await?;
    Ok(Json(Page::from_rows(rows, &page)))
}

/// POST /activities
pub async fn create_activity(
    auth: AuthUser,
    State(state): State<AppState>,
    correlation: CorrelationId,
    ValidatedJson(input): ValidatedJson<CreateActivity>,
) -> AppResult<(StatusCode, Json<DataResponse<Activity>>)> {
    let activity = ActivityRepo::create(&state.pool, auth.user_id, &input).await?;

    tracing::info!(
        activity_id = activity.id,
        user_id = auth.user_id,
        activity_type = ?activity.activity_type,
        "Activity created",
    );
    state.audit.record(
        CreateAuditLog::new(actions::ACTIVITY_CREATE, entities::ACTIVITY)
            .actor(auth.user_id)
            .entity_id(activity.id)
            .after(snapshot(&activity))
            .correlation_id(correlation.into_inner()),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: activity })))
}

/// GET /activities/{id}
pub async fn get_activity(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Activity>>> {
    let activity = ActivityRepo::find_by_id(&state.pool, id, auth.owner_scope())
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: activity }))
}

/// PATCH /activities/{id}
pub async fn update_activity(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    correlation: CorrelationId,
    ValidatedJson(input): ValidatedJson<UpdateActivity>,
) -> AppResult<Json<DataResponse<Activity>>> {
    if input.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "At least one field must be provided".into(),
        )));
    }

    let owner = auth.owner_scope();
    let before = ActivityRepo::find_by_id(&state.pool, id, owner)
        .await?
        .ok_or_else(|| not_found(id))?;
    let activity = ActivityRepo::update(&state.pool, id, owner, &input)
        .await?
        .ok_or_else(|| not_found(id))?;

    state.audit.record(
        CreateAuditLog::new(actions::ACTIVITY_UPDATE, entities::ACTIVITY)
            .actor(auth.user_id)
            .entity_id(id)
            .before(snapshot(&before))
            .after(snapshot(&activity))
            .correlation_id(correlation.into_inner()),
    );

    Ok(Json(DataResponse { data: activity }))
}

/// DELETE /activities/{id}
pub async fn delete_activity(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    correlation: CorrelationId,
) -> AppResult<StatusCode> {
    let deleted = ActivityRepo::delete(&state.pool, id, auth.owner_scope())
        .await?
        .ok_or_else(|| not_found(id))?;

    state.audit.record(
        CreateAuditLog::new(actions::ACTIVITY_DELETE, entities::ACTIVITY)
            .actor(auth.user_id)
            .entity_id(id)
            .before(snapshot(&deleted))
            .correlation_id(correlation.into_inner()),
    );

    Ok(StatusCode::NO_CONTENT)
}
