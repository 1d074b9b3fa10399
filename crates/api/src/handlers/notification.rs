//! Handlers for the `/notifications` resource.
//!
//! Everything except the producer endpoint acts on the caller's own
//! notifications only.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use crm_core::audit::{actions, entities};
use crm_core::error::CoreError;
use crm_core::pagination::{Page, PageRequest};
use crm_core::roles::permissions;
use crm_db::models::audit::CreateAuditLog;
use crm_db::models::notification::{BulkReadUpdate, CreateNotification, Notification};
use crm_db::repositories::{NotificationRepo, UserRepo};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::audit::snapshot;
use crate::error::{AppError, AppResult};
use crate::extract::{CorrelationId, ValidatedJson, ValidatedQuery};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, UpdatedCount};
use crate::state::AppState;

/// Query parameters for `GET /notifications`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct NotificationQuery {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
    /// Only unread notifications. Defaults to `false`.
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

/// GET /notifications
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<NotificationQuery>,
) -> AppResult<Json<Page<Notification>>> {
    let page = PageRequest::parse(params.limit, params.cursor.as_deref())?;
    let rows =
        NotificationRepo::list_for_user(&state.pool, auth.user_id, params.unread_only, &page)
            .await?;
    Ok(Json(Page::from_rows(rows, &page)))
}

/// GET /notifications/unread-count
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UnreadCount>>> {
    let count = NotificationRepo::unread_count(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: UnreadCount { count },
    }))
}

/// PATCH /notifications
///
/// Set the read state of up to 500 of the caller's notifications in one
/// statement. Ids that are unknown, foreign, or already in the requested
/// state are skipped, so `updated` never exceeds the number of distinct ids.
pub async fn bulk_update(
    auth: AuthUser,
    State(state): State<AppState>,
    correlation: CorrelationId,
    ValidatedJson(input): ValidatedJson<BulkReadUpdate>,
) -> AppResult<Json<DataResponse<UpdatedCount>>> {
    let mut ids = input.ids;
    ids.sort_unstable();
    ids.dedup();

    let updated =
        NotificationRepo::set_read_state(&state.pool, auth.user_id, &ids, input.read).await?;

    if updated > 0 {
        state.audit.record(
            CreateAuditLog::new(actions::NOTIFICATION_BULK_UPDATE, entities::NOTIFICATION)
                .actor(auth.user_id)
                .after(json!({ "ids": ids, "read": input.read, "updated": updated }))
                .correlation_id(correlation.into_inner()),
        );
    }

    Ok(Json(DataResponse {
        data: UpdatedCount { updated },
    }))
}

/// POST /notifications/read-all
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
    correlation: CorrelationId,
) -> AppResult<Json<DataResponse<UpdatedCount>>> {
    let updated = NotificationRepo::mark_all_read(&state.pool, auth.user_id).await?;

    if updated > 0 {
        state.audit.record(
            CreateAuditLog::new(actions::NOTIFICATION_READ_ALL, entities::NOTIFICATION)
                .actor(auth.user_id)
                .after(json!({ "read": true, "updated": updated }))
                .correlation_id(correlation.into_inner()),
        );
    }
    Ok(Json(DataResponse {
        data: UpdatedCount { updated },
    }))
}

/// POST /notifications
///
/// In-app producer: deliver a notification to any user. Requires the
/// `notifications:send` permission (admins hold it implicitly).
pub async fn create_notification(
    auth: AuthUser,
    State(state): State<AppState>,
    correlation: CorrelationId,
    ValidatedJson(input): ValidatedJson<CreateNotification>,
) -> AppResult<(StatusCode, Json<DataResponse<Notification>>)> {
    auth.ensure_permission(permissions::NOTIFICATIONS_SEND)?;

    if UserRepo::find_by_id(&state.pool, input.user_id).await?.is_none() {
        return Err(AppError::Core(CoreError::not_found("User", input.user_id)));
    }

    let notification = NotificationRepo::create(&state.pool, &input).await?;

    state.audit.record(
        CreateAuditLog::new(actions::NOTIFICATION_SEND, entities::NOTIFICATION)
            .actor(auth.user_id)
            .entity_id(notification.id)
            .after(snapshot(&notification))
            .correlation_id(correlation.into_inner()),
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse { data: notification }),
    ))
}
