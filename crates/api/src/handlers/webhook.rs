//! Handlers for the `/webhooks` resource.
//!
//! Webhooks are created and deleted, never updated. The signing secret is
//! write-only: responses only report `has_secret`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use crm_core::audit::{actions, entities};
use crm_core::error::CoreError;
use crm_core::pagination::{Page, PageRequest};
use crm_core::types::DbId;
use crm_db::models::audit::CreateAuditLog;
use crm_db::models::webhook::{CreateWebhook, Webhook};
use crm_db::repositories::WebhookRepo;

use super::CursorParams;
use crate::audit::snapshot;
use crate::error::{AppError, AppResult};
use crate::extract::{CorrelationId, ValidatedJson, ValidatedQuery};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::not_found("Webhook", id))
}

/// POST /webhooks
pub async fn create_webhook(
    auth: AuthUser,
    State(state): State<AppState>,
    correlation: CorrelationId,
    ValidatedJson(input): ValidatedJson<CreateWebhook>,
) -> AppResult<(StatusCode, Json<DataResponse<Webhook>>)> {
    let webhook = WebhookRepo::create(&state.pool, auth.user_id, &input).await?;

    tracing::info!(webhook_id = webhook.id, event = %webhook.event, "Webhook registered");
    state.audit.record(
        CreateAuditLog::new(actions::WEBHOOK_CREATE, entities::WEBHOOK)
            .actor(auth.user_id)
            .entity_id(webhook.id)
            .after(snapshot(&webhook))
            .correlation_id(correlation.into_inner()),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: webhook })))
}

/// GET /webhooks
pub async fn list_webhooks(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<CursorParams>,
) -> AppResult<Json<Page<Webhook>>> {
    let page = PageRequest::parse(params.limit, params.cursor.as_deref())?;
    let rows = WebhookRepo::list(&state.pool, auth.owner_scope(), &page).await?;
    Ok(Json(Page::from_rows(rows, &page)))
}

/// GET /webhooks/{id}
pub async fn get_webhook(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Webhook>>> {
    let webhook = WebhookRepo::find_by_id(&state.pool, id, auth.owner_scope())
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: webhook }))
}

/// DELETE /webhooks/{id}
pub async fn delete_webhook(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    correlation: CorrelationId,
) -> AppResult<StatusCode> {
    let deleted = WebhookRepo::delete(&state.pool, id, auth.owner_scope())
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(webhook_id = id, user_id = auth.user_id, "Webhook deleted");
    state.audit.record(
        CreateAuditLog::new(actions::WEBHOOK_DELETE, entities::WEBHOOK)
            .actor(auth.user_id)
            .entity_id(id)
            .before(snapshot(&deleted))
            .correlation_id(correlation.into_inner()),
    );

    Ok(StatusCode::NO_CONTENT)
}
